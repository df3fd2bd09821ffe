/// WGSL source of the expansion kernel.
pub const EXPAND_WAVEFRONT_SRC: &str = include_str!("shaders/expand_wavefront.wgsl");

/// Entry point of [`EXPAND_WAVEFRONT_SRC`].
pub const EXPAND_WAVEFRONT_ENTRY: &str = "expand_wavefront";

/// Must match `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 64;
