//! sortfold - classify a directory tree into category folders
//!
//! This library resolves a category for every file of a source tree, moves
//! it under the matching folder of a destination root, relocates albums,
//! installers and repositories as whole directories, routes archives next
//! to their extracted siblings, and prunes the directories left empty.

pub mod archive;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod file_category;
pub mod media;
pub mod organizer;
pub mod output;
pub mod path_planner;
pub mod registry;
pub mod resolver;
pub mod statistics;

pub use archive::{ArchiveRoute, ArchiveSiblingMatcher};
pub use config::{AppConfig, CompiledConfig, ConfigError, FolderNames};
pub use file_category::{Category, CategoryId, NonSplittable};
pub use organizer::Organizer;
pub use output::{BufferedMessageWriter, ConsoleMessageWriter, MessageWriter};
pub use path_planner::{OrganizeError, OrganizeResult};
pub use registry::{CategoryRegistry, RegistryError};
pub use resolver::{CategoryResolver, ClassificationOutcome};
pub use statistics::RunStatistics;

pub use cli::{CliArgs, run_cli};
