pub mod outline;
pub mod scene_pass;
