mod registry;

pub use registry::{
    ConflictRecord, PlayerRecord, PlayerStatus, Registry, Resolution, Sighting,
};
