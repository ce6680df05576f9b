//! Move notation: origin square, destination square and an optional
//! promotion letter, e.g. `e2e4` or `a7a8Q`.

use crate::error::NotationError;
use crate::square::Square;
use crate::types::PieceKind;

/// A notation that has been read but not yet matched against a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedNotation {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

pub fn parse_notation(txt: &str) -> Result<ParsedNotation, NotationError> {
    let chars: Vec<char> = txt.chars().collect();
    if !(4..=5).contains(&chars.len()) {
        return Err(NotationError::BadLength(chars.len()));
    }
    let from: Square = chars[0..2].iter().collect::<String>().parse()?;
    let to: Square = chars[2..4].iter().collect::<String>().parse()?;
    let promotion = match chars.get(4) {
        Some(&c) => Some(PieceKind::from_promotion_letter(c).ok_or(NotationError::BadPromotion(c))?),
        None => None,
    };
    Ok(ParsedNotation {
        from,
        to,
        promotion,
    })
}
