pub mod hit_testing;
pub mod resolver;

pub use hit_testing::{HANDLE_TOLERANCE, ResizeHandle, handle_at, handle_tolerance, text_bounds};
pub use resolver::{
    Resolve, ResolvedFrame, ResolvedLayers, ResolvedLogo, ResolvedText, image_size,
    materialize_relative, resolve_absolute, sync_relative_from_absolute,
};
