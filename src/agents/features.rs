//! Hand-crafted board features for linear value approximation.
//!
//! Each side contributes, in order: legal-move count, disc count, corner
//! discs, non-corner edge discs and diagonal discs (the corners of every
//! concentric ring), all divided by the number of cells, followed by the disc
//! density of each ring from the outside in and of any inner block left over.
//! ME's features come first, then OPPONENT's.

use crate::game::{Board, BoardSize, Player, Position};

/// Features per side that do not depend on the ring layout
const SCALAR_FEATURES: usize = 5;

/// Number of complete rings and whether an inner block remains
fn ring_layout(size: BoardSize) -> (usize, bool) {
    let rings = size.rows().min(size.cols()) / 2;
    let inner_rows = size.rows() - 2 * rings;
    let inner_cols = size.cols() - 2 * rings;
    (rings, inner_rows > 0 && inner_cols > 0)
}

/// Length of [`features`] for boards of `size`
pub fn feature_count(size: BoardSize) -> usize {
    let (rings, inner) = ring_layout(size);
    2 * (SCALAR_FEATURES + rings + usize::from(inner))
}

/// Feature vector of a board in ME's view
pub fn features(board: &Board) -> Vec<f64> {
    let mut out = Vec::with_capacity(feature_count(board.size()));
    for side in [Player::ME, Player::OPPONENT] {
        side_features(board, side, &mut out);
    }
    out
}

fn ring_of(size: BoardSize, position: Position) -> usize {
    let Position { row, col } = position;
    row.min(col)
        .min(size.rows() - 1 - row)
        .min(size.cols() - 1 - col)
}

fn is_ring_corner(size: BoardSize, position: Position, ring: usize) -> bool {
    let (top, left) = (ring, ring);
    let (bottom, right) = (size.rows() - 1 - ring, size.cols() - 1 - ring);
    (position.row == top || position.row == bottom)
        && (position.col == left || position.col == right)
}

fn side_features(board: &Board, side: Player, out: &mut Vec<f64>) {
    let size = board.size();
    let cells = size.cells() as f64;
    let (rings, inner) = ring_layout(size);
    let mine = side.to_cell();

    let mut discs = 0usize;
    let mut corners = 0usize;
    let mut edges = 0usize;
    let mut diagonal = 0usize;
    let mut per_ring = vec![0usize; rings];
    let mut inner_discs = 0usize;

    for (index, &cell) in board.cells().iter().enumerate() {
        if cell != mine {
            continue;
        }
        discs += 1;
        let position = size.position(index);
        let ring = ring_of(size, position);
        if ring < rings {
            per_ring[ring] += 1;
            if is_ring_corner(size, position, ring) {
                diagonal += 1;
                if ring == 0 {
                    corners += 1;
                }
            } else if ring == 0 {
                edges += 1;
            }
        } else {
            inner_discs += 1;
        }
    }

    let moves = board.legal_moves(side).len();
    out.extend([moves, discs, corners, edges, diagonal].map(|n| n as f64 / cells));

    for (ring, &count) in per_ring.iter().enumerate() {
        let rows = size.rows() - 2 * ring;
        let cols = size.cols() - 2 * ring;
        let capacity = 4 + 2 * (rows - 2) + 2 * (cols - 2);
        out.push(count as f64 / capacity as f64);
    }
    if inner {
        let capacity = (size.rows() - 2 * rings) * (size.cols() - 2 * rings);
        out.push(inner_discs as f64 / capacity as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cell;

    fn count(board: &Board, cell: Cell) -> usize {
        board.cells().iter().filter(|&&c| c == cell).count()
    }

    #[test]
    fn test_feature_count_follows_ring_layout() {
        assert_eq!(feature_count(BoardSize::square(4).unwrap()), 14);
        assert_eq!(feature_count(BoardSize::square(8).unwrap()), 18);
        assert_eq!(feature_count(BoardSize::new(2, 6).unwrap()), 12);
    }

    #[test]
    fn test_initial_board_features() {
        let board = Board::initial(BoardSize::square(4).unwrap());
        let phi = features(&board);
        assert_eq!(phi.len(), 14);

        // ME (White) holds the two centre diagonal cells, which are the
        // corners of the inner ring.
        let me = &phi[..7];
        assert_eq!(me[0], 4.0 / 16.0);
        assert_eq!(me[1], 2.0 / 16.0);
        assert_eq!(me[2], 0.0);
        assert_eq!(me[3], 0.0);
        assert_eq!(me[4], 2.0 / 16.0);
        assert_eq!(me[5], 0.0);
        assert_eq!(me[6], 2.0 / 4.0);
        assert_eq!(&phi[8..], &me[1..]);
    }

    #[test]
    fn test_corners_edges_and_rings() {
        let board = Board::from_rows(&["W..W", "W...", "....", "B..B"]).unwrap();
        let phi = features(&board);
        assert_eq!(count(&board, Cell::White), 3);

        let me = &phi[..7];
        assert_eq!(me[1], 3.0 / 16.0);
        assert_eq!(me[2], 2.0 / 16.0);
        assert_eq!(me[3], 1.0 / 16.0);
        assert_eq!(me[4], 2.0 / 16.0);
        assert_eq!(me[5], 3.0 / 12.0);
        assert_eq!(me[6], 0.0);

        let opponent = &phi[7..];
        assert_eq!(opponent[2], 2.0 / 16.0);
        assert_eq!(opponent[3], 0.0);
        assert_eq!(opponent[5], 2.0 / 12.0);
    }
}
