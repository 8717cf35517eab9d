pub mod detection {
    pub mod domain {
        pub mod detection_sampler;
        pub mod embedding;
        pub mod face_embedder;
        pub mod object_detector;
    }
    pub mod infrastructure;
}

pub mod display {
    pub mod domain {
        pub mod display_sink;
        pub mod display_throttle;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod infrastructure;
    pub mod load_reference_use_case;
    pub mod orchestrator;
    pub mod pipeline_logger;
    pub mod track_face_use_case;
}

pub mod shared {
    pub mod bounding_box;
    pub mod config;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod tracking {
    pub mod domain {
        pub mod face_matcher;
        pub mod latest_slot;
        pub mod match_job;
        pub mod track_overlay;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod image_file_reader;
    }
}

#[cfg(test)]
pub(crate) mod test_support;
