pub mod image_folder;
pub mod provider;
pub mod sample;
pub mod synthetic;

pub use image_folder::ImageFolderProvider;
pub use provider::{partition, DatasetProvider, InMemoryProvider, Partition};
pub use sample::Sample;
pub use synthetic::SyntheticProvider;
