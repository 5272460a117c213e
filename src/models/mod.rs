pub mod certification;
pub mod feedback;
pub mod info_doc;
pub mod park;
pub mod park_guide;
pub mod payment;
pub mod plant;
pub mod progress;
pub mod purchase;
pub mod quiz;
pub mod training_module;
pub mod user;
