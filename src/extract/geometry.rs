//! Geometry parser for inline positioning styles
//!
//! Graphical pages position every tool with an inline style of the form
//! `top:10px;left:20px;width:30px;height:40px;`. The parser turns that
//! string into a [`Rect`]; a style with fewer than four numeric tokens is
//! a hard per-tool failure, never silently defaulted.

use crate::model::Rect;
use crate::ExtractError;

/// Parses an inline style string into a rectangle
///
/// The four `<number>px;` tokens are read in the platform's fixed
/// top/left/width/height order. Occasional negative offsets are clamped
/// to zero to uphold the non-negative Rect invariant.
///
/// # Arguments
///
/// * `style` - The raw `style` attribute value of a tool element
///
/// # Returns
///
/// * `Ok(Rect)` - The parsed rectangle
/// * `Err(ExtractError::MalformedGeometry)` - Fewer than four numeric tokens
///
/// # Examples
///
/// ```
/// use weavemap::extract::parse_style;
///
/// let rect = parse_style("top:10px;left:20px;width:30px;height:40px;").unwrap();
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (10, 20, 30, 40));
/// ```
pub fn parse_style(style: &str) -> Result<Rect, ExtractError> {
    let mut values = [0i64; 4];
    let mut tokens = style.split("px;");

    for (index, slot) in values.iter_mut().enumerate() {
        let token = tokens.next().ok_or_else(|| malformed(style, index))?;
        let number = token
            .rsplit(':')
            .next()
            .map(str::trim)
            .ok_or_else(|| malformed(style, index))?;
        let parsed: i64 = number.parse().map_err(|_| malformed(style, index))?;
        *slot = parsed.max(0);
    }

    Ok(Rect::new(values[0], values[1], values[2], values[3]))
}

fn malformed(style: &str, index: usize) -> ExtractError {
    ExtractError::MalformedGeometry {
        style: style.to_string(),
        message: format!("expected 4 numeric px tokens, failed at token {}", index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_style() {
        let rect = parse_style("top:0px;left:0px;width:100px;height:100px;").unwrap();
        assert_eq!(rect, Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_parse_style_with_spaces() {
        let rect = parse_style("top: 50px; left: 50px; width: 100px; height: 100px;").unwrap();
        assert_eq!(rect, Rect::new(50, 50, 100, 100));
    }

    #[test]
    fn test_token_order_is_fixed() {
        let rect = parse_style("top:1px;left:2px;width:3px;height:4px;").unwrap();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (1, 2, 3, 4));
    }

    #[test]
    fn test_negative_offsets_clamped() {
        let rect = parse_style("top:-16px;left:5px;width:10px;height:10px;").unwrap();
        assert_eq!(rect, Rect::new(0, 5, 10, 10));
    }

    #[test]
    fn test_too_few_tokens_fails() {
        let result = parse_style("top:10px;left:20px;");
        assert!(matches!(
            result,
            Err(ExtractError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn test_empty_style_fails() {
        assert!(parse_style("").is_err());
    }

    #[test]
    fn test_non_numeric_token_fails() {
        let result = parse_style("top:abcpx;left:20px;width:30px;height:40px;");
        assert!(matches!(
            result,
            Err(ExtractError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn test_trailing_content_ignored() {
        // Extra declarations after the four positional tokens are irrelevant
        let rect =
            parse_style("top:10px;left:20px;width:30px;height:40px;z-index:5;").unwrap();
        assert_eq!(rect, Rect::new(10, 20, 30, 40));
    }
}
