pub mod compendium;
pub mod files;
pub mod hub;
pub mod service;
