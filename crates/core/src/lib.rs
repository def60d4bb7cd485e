//! Face liveness decision engine.
//!
//! Given per-frame face detections and a spoof classifier, decides whether
//! the tracked face is a live person and when to request a capture.

pub mod shared {
    pub mod constants;
    pub mod face_box;
    pub mod frame;
    pub mod model_resolver;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod liveness {
    pub mod domain {
        pub mod arbitration;
        pub mod blink;
        pub mod candidate_gate;
        pub mod capture_countdown;
        pub mod face_observation;
        pub mod history_buffer;
        pub mod liveness_config;
        pub mod liveness_error;
        pub mod spoof_classifier;
        pub mod stillness;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod face_crop;
    pub mod liveness_session;
    pub mod session_logger;
    pub mod infrastructure {
        pub mod latest_frame_worker;
    }
}
