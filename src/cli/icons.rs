//! Console output icons.

use console::{style, StyledObject};

/// Success checkmark icon (green ✓).
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

/// Info/progress arrow icon (cyan →).
pub fn info() -> StyledObject<&'static str> {
    style("→").cyan()
}

/// Warning icon (yellow !).
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Error icon (red ✗).
pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_render() {
        assert!(success().to_string().contains('✓'));
        assert!(info().to_string().contains('→'));
        assert!(warn().to_string().contains('!'));
        assert!(error().to_string().contains('✗'));
    }
}
