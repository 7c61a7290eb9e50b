pub mod linker;
pub mod sessions;

pub use linker::{
    classify_capture, commit_binding, find_capture, find_fix, latest_chain, latest_unfixed,
    open_captures, similar_captures, CaptureClass, ChainView, OpenCapture, SimilarCapture,
};
pub use sessions::{
    build_sessions, day_status, next_session_id, Anomaly, DayStatus, Selection, SessionIndex,
    SessionView,
};

#[cfg(test)]
pub(crate) mod testutil;
