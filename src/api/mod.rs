pub mod elevenlabs;
pub mod pexels;
pub mod youtube;
