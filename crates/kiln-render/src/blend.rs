//! Blend modes supported by the dispatcher.

use kiln_gfx::{BlendFactor, BlendFunction};

/// How source and destination colors are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Standard alpha blending.
    ///
    /// Formula: `src.rgb * src.a + dst.rgb * (1 - src.a)`
    #[default]
    Alpha,

    /// Additive blending.
    ///
    /// Formula: `src.rgb * src.a + dst.rgb`
    ///
    /// Use for: Glow effects, particles, light sources.
    Add,

    /// Multiplicative blending.
    ///
    /// Formula: `src.rgb * dst.rgb`
    Multiply,

    /// No blending - source completely replaces destination.
    None,
}

impl BlendMode {
    /// Backend factors for this mode.
    ///
    /// With `separate` support the alpha channel is blended on its own so that
    /// an offscreen target ends up with a usable alpha value; without it the
    /// color factors apply to alpha too.
    pub fn blend_function(self, separate: bool) -> BlendFunction {
        use BlendFactor::*;

        match self {
            BlendMode::Alpha if separate => BlendFunction::separate(SrcAlpha, OneMinusSrcAlpha, One, OneMinusSrcAlpha),
            BlendMode::Alpha => BlendFunction::combined(SrcAlpha, OneMinusSrcAlpha),
            BlendMode::Add if separate => BlendFunction::separate(SrcAlpha, One, One, One),
            BlendMode::Add => BlendFunction::combined(SrcAlpha, One),
            BlendMode::Multiply => BlendFunction::combined(DstColor, Zero),
            BlendMode::None => BlendFunction::combined(One, Zero),
        }
    }
}
