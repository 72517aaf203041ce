//! Constants shared across the service.

/// Suffix appended to the source key stem to form the preview key.
pub const PREVIEW_SUFFIX: &str = "-preview";

/// Extension of the rendered product.
pub const PREVIEW_EXTENSION: &str = ".pdf";

/// Content type of the uploaded preview and of the callback payload entry.
pub const PREVIEW_CONTENT_TYPE: &str = "application/pdf";

/// Status reported in the callback payload of a finished job.
pub const STATUS_COMPLETED: &str = "completed";

/// Replacement for path separators when a key seeds a local file name.
pub const KEY_SEPARATOR_ESCAPE: char = '_';

/// Method used for callbacks when the request does not name one.
pub const DEFAULT_CALLBACK_METHOD: &str = "POST";
