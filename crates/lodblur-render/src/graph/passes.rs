/// The four passes of a frame, in execution order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassKind {
    HorizontalBlur,
    VerticalBlur,
    Upsample,
    Composite,
}

impl PassKind {
    pub const ORDER: [PassKind; 4] = [
        PassKind::HorizontalBlur,
        PassKind::VerticalBlur,
        PassKind::Upsample,
        PassKind::Composite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PassKind::HorizontalBlur => "lodblur horizontal blur pass",
            PassKind::VerticalBlur => "lodblur vertical blur pass",
            PassKind::Upsample => "lodblur upsample pass",
            PassKind::Composite => "lodblur composite pass",
        }
    }

    /// Whether the pass reads the sample level scalar.
    pub fn is_blur(self) -> bool {
        matches!(self, PassKind::HorizontalBlur | PassKind::VerticalBlur)
    }
}

/// What happens to an attachment's previous contents when a pass begins.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LoadAction {
    Load,
    Clear,
}

/// Load/store behavior of one pass's color attachment.
///
/// The intermediate passes keep their previous contents (every pixel is
/// overwritten by the fullscreen draw anyway); the composite pass clears.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PassDescriptor {
    pub load: LoadAction,
    pub clear: wgpu::Color,
    pub store: bool,
}

impl PassDescriptor {
    pub fn intermediate() -> Self {
        Self {
            load: LoadAction::Load,
            clear: wgpu::Color::BLACK,
            store: true,
        }
    }

    pub fn composite(clear: wgpu::Color) -> Self {
        Self {
            load: LoadAction::Clear,
            clear,
            store: true,
        }
    }

    pub fn color_ops(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: match self.load {
                LoadAction::Load => wgpu::LoadOp::Load,
                LoadAction::Clear => wgpu::LoadOp::Clear(self.clear),
            },
            store: if self.store {
                wgpu::StoreOp::Store
            } else {
                wgpu::StoreOp::Discard
            },
        }
    }
}

/// Depth attachment ops for the composite pass: cleared to 1.0, not kept.
pub fn composite_depth_ops() -> wgpu::Operations<f32> {
    wgpu::Operations {
        load: wgpu::LoadOp::Clear(1.0),
        store: wgpu::StoreOp::Discard,
    }
}

/// What one pass did during a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PassRecord {
    pub kind: PassKind,
    pub source_extent: (u32, u32),
    pub target_extent: (u32, u32),
    /// Level read by a blur pass; `None` for the others.
    pub sample_level: Option<u32>,
    pub source_mip_count: u32,
}

/// Summary of an encoded frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub passes: Vec<PassRecord>,
    pub depth_rebuilt: bool,
    pub uniform_slot: usize,
    pub mipmaps_scheduled: bool,
}

impl FrameReport {
    pub fn pass(&self, kind: PassKind) -> Option<&PassRecord> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    pub fn order(&self) -> Vec<PassKind> {
        self.passes.iter().map(|p| p.kind).collect()
    }

    /// Extent of the frame's final composite target.
    pub fn composite_extent(&self) -> Option<(u32, u32)> {
        self.pass(PassKind::Composite).map(|p| p.target_extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediate_passes_load_and_store() {
        let ops = PassDescriptor::intermediate().color_ops();
        assert_eq!(ops.load, wgpu::LoadOp::Load);
        assert_eq!(ops.store, wgpu::StoreOp::Store);
    }

    #[test]
    fn composite_clears_color_and_depth() {
        let gray = wgpu::Color {
            r: 0.5,
            g: 0.5,
            b: 0.5,
            a: 1.0,
        };
        let ops = PassDescriptor::composite(gray).color_ops();
        assert_eq!(ops.load, wgpu::LoadOp::Clear(gray));
        assert_eq!(composite_depth_ops().load, wgpu::LoadOp::Clear(1.0));
    }

    #[test]
    fn only_blur_passes_read_the_level() {
        let blur: Vec<_> = PassKind::ORDER.iter().filter(|k| k.is_blur()).collect();
        assert_eq!(blur, [&PassKind::HorizontalBlur, &PassKind::VerticalBlur]);
    }

    #[test]
    fn report_lookups() {
        let report = FrameReport {
            passes: vec![PassRecord {
                kind: PassKind::Composite,
                source_extent: (720, 1280),
                target_extent: (300, 200),
                sample_level: None,
                source_mip_count: 1,
            }],
            ..FrameReport::default()
        };
        assert_eq!(report.composite_extent(), Some((300, 200)));
        assert!(report.pass(PassKind::Upsample).is_none());
    }
}
