pub mod crop_export;
pub mod detection_error;
pub mod detection_request;
pub mod render_error;
pub mod request_phase;
pub mod request_result;
pub mod selected_file;
pub mod session_state;
