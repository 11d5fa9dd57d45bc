/*!
 * Tests for timestamp conversion, line wrapping and layout resolution
 */

use subburn::errors::TimecodeError;
use subburn::line_wrapper::{unwrap_markup, wrap};
use subburn::style_resolver::StyleResolver;
use subburn::timecode::convert;

/// Milliseconds are truncated, never rounded
#[test]
fn test_convert_withVariousMilliseconds_shouldTruncate() {
    let cases = [
        ("01:02:03,007", "1:02:03.00"),
        ("00:00:00,999", "0:00:00.99"),
        ("00:00:00,010", "0:00:00.01"),
        ("12:59:59,500", "12:59:59.50"),
        ("123:00:00,000", "123:00:00.00"),
    ];
    for (input, expected) in cases {
        assert_eq!(convert(input).unwrap(), expected, "Failed for input: {}", input);
    }
}

/// Anything outside the grammar is malformed
#[test]
fn test_convert_withBadInput_shouldBeMalformed() {
    for input in ["", "00:00:00.000", "0:0:0,000", "00:00:00,00", "00:61:00,000", "aa:bb:cc,ddd"] {
        assert_eq!(
            convert(input),
            Err(TimecodeError::MalformedTimestamp(input.to_string())),
            "Failed for input: {:?}",
            input
        );
    }
}

/// Wrapping never loses text
#[test]
fn test_wrap_withSentences_shouldRejoinLosslessly() {
    let sentences = [
        "The quick brown fox jumps over the lazy dog again and again",
        "Déjà vu: ça arrive à tout le monde, même aux sous-titres très longs",
        "short",
        "Supercalifragilisticexpialidocious-and-then-some-more-characters",
    ];
    for text in sentences {
        let wrapped = wrap(text, 20, 10, 40);
        assert_eq!(unwrap_markup(&wrapped), text, "Failed for text: {}", text);
    }
}

/// Split halves differ in length by as little as the word boundaries allow
#[test]
fn test_wrap_withEvenWords_shouldBalanceHalves() {
    let wrapped = wrap("aaaa bbbb cccc dddd", 10, 5, 20);
    assert_eq!(wrapped, "aaaa bbbb{\\fs5}\\N{\\fs20}cccc dddd");
}

/// Text at the limit stays on one line
#[test]
fn test_wrap_withTextAtLimit_shouldNotWrap() {
    let text = "exactly twenty chars";
    assert_eq!(text.chars().count(), 20);
    assert_eq!(wrap(text, 20, 5, 20), text);
}

/// Font size respects the floor and grows with height
#[test]
fn test_resolve_withGrowingHeight_shouldNeverShrinkFont() {
    let resolver = StyleResolver::default();
    let mut previous = 0;
    for height in [144, 240, 360, 480, 720, 1080, 1440, 2160] {
        let layout = resolver.resolve(height * 16 / 9, height);
        assert!(layout.font_size >= 30);
        assert!(layout.margin_vertical >= 24);
        assert!(layout.font_size >= previous, "Font shrank at height {}", height);
        previous = layout.font_size;
    }
}

/// 720p after upscaling gets the layout for 720p, not for the source
#[test]
fn test_resolve_at720p_shouldMatchKnownValues() {
    let layout = StyleResolver::default().resolve(1280, 720);
    assert_eq!(layout.font_size, 40);
    assert_eq!(layout.margin_vertical, 36);
    assert_eq!(layout.spacer_size, 10);
    assert_eq!(layout.canvas_width, 1280);
    assert_eq!(layout.canvas_height, 720);
}
