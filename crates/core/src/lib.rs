mod config;
mod context;
mod date;
mod error;
mod exif_reader;
mod exiftool;
mod hash;
mod id3_reader;
mod metadata;
mod numbering;
mod numeral;
mod planner;
mod random;
mod resolver;
mod template;
mod transform;

pub const DEFAULT_TEMPLATE: &str = "{{f}}_%03d{{ext}}";

pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use context::FileContext;
pub use date::{DateFormatRegistry, DateScope, FileTime, FileTimes};
pub use error::VariableError;
pub use exif_reader::ExifProvider;
pub use exiftool::{ExifToolProvider, DEFAULT_EXIFTOOL_TIMEOUT};
pub use hash::{hash_file, HashAlgorithm};
pub use id3_reader::Id3Provider;
pub use metadata::{
    exif_keys, ExifField, ExifToken, Id3Field, MetadataMap, MetadataProvider, MetadataSource,
    Providers, StaticProvider,
};
pub use numbering::{
    find_index, parse_index_spec, Counter, IndexFormat, IndexSpec, NumberingState, NumberingStep,
    SkipRange, MAX_INDEX_WIDTH,
};
pub use numeral::{integer_to_roman, to_radix, Radix, MAX_ROMAN};
pub use planner::{
    collect_files, generate_preview, PreviewOptions, PreviewStats, RenamePreview,
};
pub use random::{
    parse_random_spec, CharClass, RandomSpec, DEFAULT_RANDOM_LENGTH, MAX_RANDOM_LENGTH,
};
pub use resolver::{BatchOutcome, Change, FileEntry, FileFailure, VariableResolver};
pub use template::{
    parse_template, parse_template_with, validate_template, FilePart, Template, TemplatePart,
    Token, TokenKind, TokenMatch,
};
pub use transform::Transform;
