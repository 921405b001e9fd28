//! Board rendering. Not part of the encode/decode core; the environment
//! driver delegates here.

use chess::{Color, File, Piece, Rank, Square, ALL_SQUARES};
use ndarray::Array3;

use crate::position::Position;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderMode {
    Human,
    RgbArray,
}

const SQUARE_PX: usize = 32;
const LIGHT_SQUARE: [u8; 3] = [240, 217, 181];
const DARK_SQUARE: [u8; 3] = [181, 136, 99];
const WHITE_PIECE: [u8; 3] = [249, 249, 249];
const BLACK_PIECE: [u8; 3] = [40, 40, 40];

fn piece_char(piece: Piece, color: Color) -> char {
    let ch = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => ch.to_ascii_uppercase(),
        Color::Black => ch,
    }
}

/// Plain-text board, rank 8 at the top.
pub fn ascii_board(pos: &Position) -> String {
    let mut out = String::new();
    for rank in (0..8).rev() {
        out.push((b'1' + rank as u8) as char);
        for file in 0..8 {
            let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
            let ch = match (pos.board().piece_on(sq), pos.board().color_on(sq)) {
                (Some(piece), Some(color)) => piece_char(piece, color),
                _ => '.',
            };
            out.push(' ');
            out.push(ch);
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h");
    out
}

fn disc_radius(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 6,
        Piece::Knight => 8,
        Piece::Bishop => 9,
        Piece::Rook => 10,
        Piece::Queen => 12,
        Piece::King => 13,
    }
}

/// Rasterizes the board into an (256, 256, 3) RGB image. Pieces are drawn
/// as filled discs with a radius per piece kind.
pub fn rgb_array(pos: &Position) -> Array3<u8> {
    let size = 8 * SQUARE_PX;
    let mut img = Array3::zeros((size, size, 3));

    for sq in ALL_SQUARES {
        let rank = sq.get_rank().to_index();
        let file = sq.get_file().to_index();
        let (top, left) = ((7 - rank) * SQUARE_PX, file * SQUARE_PX);

        let fill = if (rank + file) % 2 == 0 {
            DARK_SQUARE
        } else {
            LIGHT_SQUARE
        };
        for y in 0..SQUARE_PX {
            for x in 0..SQUARE_PX {
                for channel in 0..3 {
                    img[[top + y, left + x, channel]] = fill[channel];
                }
            }
        }

        if let (Some(piece), Some(color)) = (pos.board().piece_on(sq), pos.board().color_on(sq)) {
            let rgb = match color {
                Color::White => WHITE_PIECE,
                Color::Black => BLACK_PIECE,
            };
            let radius = disc_radius(piece);
            let center = (SQUARE_PX / 2) as i32;
            for y in 0..SQUARE_PX {
                for x in 0..SQUARE_PX {
                    let (dy, dx) = (y as i32 - center, x as i32 - center);
                    if dy * dy + dx * dx <= radius * radius {
                        for channel in 0..3 {
                            img[[top + y, left + x, channel]] = rgb[channel];
                        }
                    }
                }
            }
        }
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_start_position() {
        let board = ascii_board(&Position::new());
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8 r n b q k b n r");
        assert_eq!(lines[6], "2 P P P P P P P P");
        assert_eq!(lines[8], "  a b c d e f g h");
    }

    #[test]
    fn raster_shape_and_content() {
        let img = rgb_array(&Position::new());
        assert_eq!(img.dim(), (256, 256, 3));
        // a1 is a dark square; its corner pixel is never covered by a disc.
        assert_eq!(img[[255, 0, 0]], DARK_SQUARE[0]);
        // The white king sits in the middle of e1.
        let center = 7 * SQUARE_PX + SQUARE_PX / 2;
        assert_eq!(img[[center, 4 * SQUARE_PX + SQUARE_PX / 2, 0]], WHITE_PIECE[0]);
    }
}
