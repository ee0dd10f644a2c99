//! WGSL programs and their validation.
//!
//! Sources are parsed and validated with naga before a module is created, so
//! a broken program is a startup error with a readable report instead of a
//! fault at first draw.

use anyhow::{anyhow, Context, Result};

/// Programs for the horizontal blur, vertical blur, upsample, and composite passes.
pub const PASSES_WGSL: &str = include_str!("shaders/passes.wgsl");

/// Mip chain blit used by [`crate::mipmap::TextureUtility`].
pub const MIPMAP_WGSL: &str = include_str!("shaders/mipmap.wgsl");

/// Entry points the pass pipelines are built from.
pub mod entry {
    pub const BASIC_VERTEX: &str = "basic_vertex";
    pub const BASIC_FRAGMENT: &str = "basic_fragment";
    pub const HORIZONTAL_BOX_BLUR_FRAGMENT: &str = "horizontal_box_blur_fragment";
    pub const VERTICAL_BOX_BLUR_FRAGMENT: &str = "vertical_box_blur_fragment";
    pub const COMPOSITE_VERTEX: &str = "composite_vertex";
    pub const COMPOSITE_FRAGMENT: &str = "composite_fragment";

    pub const ALL: [&str; 6] = [
        BASIC_VERTEX,
        BASIC_FRAGMENT,
        HORIZONTAL_BOX_BLUR_FRAGMENT,
        VERTICAL_BOX_BLUR_FRAGMENT,
        COMPOSITE_VERTEX,
        COMPOSITE_FRAGMENT,
    ];
}

/// Parses and validates WGSL, returning the naga module.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL parse failed:\n{}", e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("WGSL validation failed: {e:?}"))?;

    Ok(module)
}

/// Validates `source` and creates a shader module from it.
///
/// Checks that every name in `entry_points` exists in the module.
pub fn create_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entry_points: &[&str],
) -> Result<wgpu::ShaderModule> {
    let module = validate_wgsl(source).with_context(|| format!("shader `{label}`"))?;

    for name in entry_points {
        anyhow::ensure!(
            module.entry_points.iter().any(|ep| ep.name == *name),
            "shader `{label}` has no entry point `{name}`"
        );
    }

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_programs_validate() {
        let module = validate_wgsl(PASSES_WGSL).unwrap();
        for name in entry::ALL {
            assert!(
                module.entry_points.iter().any(|ep| ep.name == name),
                "missing entry point {name}"
            );
        }
    }

    #[test]
    fn mipmap_program_validates() {
        let module = validate_wgsl(MIPMAP_WGSL).unwrap();
        assert_eq!(module.entry_points.len(), 2);
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = validate_wgsl("fn broken( {").unwrap_err();
        assert!(format!("{err}").contains("WGSL parse failed"));
    }
}
