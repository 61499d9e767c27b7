// Service module exports

pub mod database;
pub mod local_store;
pub mod normalize;
pub mod notification;
pub mod remote;
pub mod settings;
pub mod sync;
pub mod trash;
pub mod working_set;
