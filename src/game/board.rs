//! Board representation, move generation and the canonical board code

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A cell on the Reversi board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    White,
    Black,
}

impl Cell {
    /// Two-bit code used by [`Board::encode`]
    pub fn code(self) -> u128 {
        match self {
            Cell::Empty => 0,
            Cell::White => 1,
            Cell::Black => 2,
        }
    }

    fn from_code(code: u128) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::White),
            2 => Some(Cell::Black),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::White => 'W',
            Cell::Black => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | ' ' => Some(Cell::Empty),
            'W' | 'w' | 'O' | 'o' => Some(Cell::White),
            'B' | 'b' | 'X' | 'x' => Some(Cell::Black),
            _ => None,
        }
    }

    /// The disc owner, if any
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::White => Some(Player::White),
            Cell::Black => Some(Player::Black),
        }
    }

    fn swapped(self) -> Cell {
        match self {
            Cell::Empty => Cell::Empty,
            Cell::White => Cell::Black,
            Cell::Black => Cell::White,
        }
    }
}

/// A player (side) in the game
///
/// Absolute sides are White and Black. In a relative view the acting side is
/// always stored as White, so [`Player::ME`] and [`Player::OPPONENT`] alias the
/// two absolute sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    White,
    Black,
}

impl Player {
    /// The acting side in a relative view
    pub const ME: Player = Player::White;
    /// The other side in a relative view
    pub const OPPONENT: Player = Player::Black;

    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Convert player to cell
    pub fn to_cell(self) -> Cell {
        match self {
            Player::White => Cell::White,
            Player::Black => Cell::Black,
        }
    }

    /// Turn bit used in canonical state keys (Black moves first and gets 1)
    pub fn turn_bit(self) -> u8 {
        match self {
            Player::White => 0,
            Player::Black => 1,
        }
    }

    pub fn from_turn_bit(bit: u8) -> Player {
        if bit & 1 == 1 {
            Player::Black
        } else {
            Player::White
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "White"),
            Player::Black => write!(f, "Black"),
        }
    }
}

/// Result of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

/// A cell coordinate on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Board dimensions
///
/// Both dimensions must be even and at least 2 so the four starting discs sit
/// in the centre, and the board may hold at most 64 cells so that a board code
/// fits in a `u128` and a flip set fits in a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    rows: usize,
    cols: usize,
}

impl BoardSize {
    pub const MAX_CELLS: usize = 64;

    /// Create a validated board size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoardSize`] for odd, tiny or oversized boards.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let reason = if rows < 2 || cols < 2 {
            Some("both dimensions must be at least 2")
        } else if rows % 2 != 0 || cols % 2 != 0 {
            Some("both dimensions must be even")
        } else if rows * cols > Self::MAX_CELLS {
            Some("at most 64 cells are supported")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidBoardSize { rows, cols, reason }),
            None => Ok(Self { rows, cols }),
        }
    }

    pub fn square(side: usize) -> Result<Self> {
        Self::new(side, side)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, position: Position) -> bool {
        position.row < self.rows && position.col < self.cols
    }

    /// Row-major index of a position (also the MDP action encoding)
    pub fn index(&self, position: Position) -> usize {
        position.row * self.cols + position.col
    }

    pub fn position(&self, index: usize) -> Position {
        Position::new(index / self.cols, index % self.cols)
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for BoardSize {
    type Err = Error;

    /// Parses `"6"` (square) or `"4x6"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidConfiguration {
            message: format!("invalid board size '{s}' (expected N or RxC)"),
        };
        let mut parts = s.trim().split(['x', 'X']);
        let rows: usize = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or_else(invalid)?;
        let cols = match parts.next() {
            Some(p) => p.trim().parse().map_err(|_| invalid())?,
            None => rows,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Self::new(rows, cols)
    }
}

/// Canonical integer encoding of a board: 2 bits per cell, row-major, first
/// cell most significant.
///
/// Serialized as a `[hi, lo]` pair of `u64` words so that every serde format
/// can carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u64; 2]", into = "[u64; 2]")]
pub struct BoardCode(u128);

impl BoardCode {
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn value(self) -> u128 {
        self.0
    }
}

impl From<[u64; 2]> for BoardCode {
    fn from([hi, lo]: [u64; 2]) -> Self {
        Self(((hi as u128) << 64) | lo as u128)
    }
}

impl From<BoardCode> for [u64; 2] {
    fn from(code: BoardCode) -> Self {
        [(code.0 >> 64) as u64, code.0 as u64]
    }
}

impl fmt::Display for BoardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// An `rows × cols` Reversi board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create a board with every cell empty
    pub fn empty(size: BoardSize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size.cells()],
        }
    }

    /// Create the starting position: the four centre cells in the diagonal
    /// pattern, White on the main diagonal.
    ///
    /// ```
    /// use reversi_agents::game::{Board, BoardSize, Cell, Position};
    ///
    /// let board = Board::initial(BoardSize::square(8)?);
    /// assert_eq!(board.cell(Position::new(3, 3)), Cell::White);
    /// assert_eq!(board.cell(Position::new(3, 4)), Cell::Black);
    /// # Ok::<(), reversi_agents::Error>(())
    /// ```
    pub fn initial(size: BoardSize) -> Self {
        let mut board = Self::empty(size);
        let r = size.rows() / 2 - 1;
        let c = size.cols() / 2 - 1;
        board.set(Position::new(r, c), Cell::White);
        board.set(Position::new(r + 1, c + 1), Cell::White);
        board.set(Position::new(r + 1, c), Cell::Black);
        board.set(Position::new(r, c + 1), Cell::Black);
        board
    }

    /// Parse a board from one string per row (`.` empty, `W` white, `B` black).
    ///
    /// # Errors
    ///
    /// Returns an error if the rows are ragged, the size is unsupported or a
    /// character is not a cell.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let cols = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let size = BoardSize::new(rows.len(), cols)?;
        let mut cells = Vec::with_capacity(size.cells());
        for row in rows {
            if row.chars().count() != cols {
                return Err(Error::InvalidConfiguration {
                    message: format!("row '{row}' does not have {cols} cells"),
                });
            }
            for c in row.chars() {
                let cell = Cell::from_char(c).ok_or_else(|| Error::InvalidConfiguration {
                    message: format!("invalid cell character '{c}' in row '{row}'"),
                })?;
                cells.push(cell);
            }
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at a position (panics if out of bounds)
    pub fn cell(&self, position: Position) -> Cell {
        self.cells[self.size.index(position)]
    }

    fn set(&mut self, position: Position, cell: Cell) {
        let index = self.size.index(position);
        self.cells[index] = cell;
    }

    /// Bitmask of the discs that `side` would flip by playing at `index`.
    ///
    /// Each of the 8 rays contributes its run of opposing discs only when the
    /// run is closed by one of `side`'s discs; an edge, an empty cell or an
    /// immediately adjacent own disc contributes nothing. Legality and flip
    /// application both go through this scan.
    fn flip_mask(&self, index: usize, side: Player) -> u64 {
        let rows = self.size.rows() as isize;
        let cols = self.size.cols() as isize;
        let row = (index / self.size.cols()) as isize;
        let col = (index % self.size.cols()) as isize;
        let mine = side.to_cell();
        let theirs = side.opponent().to_cell();

        let mut mask = 0u64;
        for (dr, dc) in DIRECTIONS {
            let mut ray = 0u64;
            let (mut r, mut c) = (row + dr, col + dc);
            while (0..rows).contains(&r) && (0..cols).contains(&c) {
                let i = (r * cols + c) as usize;
                let cell = self.cells[i];
                if cell == theirs {
                    ray |= 1 << i;
                } else {
                    if cell == mine {
                        mask |= ray;
                    }
                    break;
                }
                r += dr;
                c += dc;
            }
        }
        mask
    }

    fn legal_indices(&self, side: Player) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |&(i, &cell)| cell == Cell::Empty && self.flip_mask(i, side) != 0)
            .map(|(i, _)| i)
    }

    /// Legal moves for `side`, in row-major order
    pub fn legal_moves(&self, side: Player) -> Vec<Position> {
        self.legal_indices(side)
            .map(|i| self.size.position(i))
            .collect()
    }

    pub fn has_legal_move(&self, side: Player) -> bool {
        self.legal_indices(side).next().is_some()
    }

    /// Positions flipped if `side` plays at `position` (empty if illegal)
    pub fn flips(&self, position: Position, side: Player) -> Vec<Position> {
        if !self.size.contains(position) || self.cell(position) != Cell::Empty {
            return Vec::new();
        }
        let mut mask = self.flip_mask(self.size.index(position), side);
        let mut flipped = Vec::with_capacity(mask.count_ones() as usize);
        while mask != 0 {
            flipped.push(self.size.position(mask.trailing_zeros() as usize));
            mask &= mask - 1;
        }
        flipped
    }

    /// Place a disc for `side` and flip every enclosed opposing disc.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalMove`] when the position is out of bounds,
    /// occupied, or flips nothing.
    #[must_use = "apply_move returns a new board; the original is unchanged"]
    pub fn apply_move(&self, position: Position, side: Player) -> Result<Board> {
        let illegal = |reason| Error::IllegalMove {
            row: position.row,
            col: position.col,
            reason,
        };

        if !self.size.contains(position) {
            return Err(illegal("position is out of bounds"));
        }
        let index = self.size.index(position);
        if self.cells[index] != Cell::Empty {
            return Err(illegal("position is occupied"));
        }
        let mut mask = self.flip_mask(index, side);
        if mask == 0 {
            return Err(illegal("move flips no discs"));
        }

        let mut next = self.clone();
        let cell = side.to_cell();
        next.cells[index] = cell;
        while mask != 0 {
            next.cells[mask.trailing_zeros() as usize] = cell;
            mask &= mask - 1;
        }
        Ok(next)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != Cell::Empty)
    }

    /// True iff the board is full or neither side can move
    pub fn is_finished(&self) -> bool {
        self.is_full()
            || (!self.has_legal_move(Player::White) && !self.has_legal_move(Player::Black))
    }

    pub fn disc_count(&self, side: Player) -> usize {
        let cell = side.to_cell();
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Sign of the disc difference; meaningful once the game is finished
    pub fn winner(&self) -> GameOutcome {
        let white = self.disc_count(Player::White);
        let black = self.disc_count(Player::Black);
        match white.cmp(&black) {
            std::cmp::Ordering::Greater => GameOutcome::Win(Player::White),
            std::cmp::Ordering::Less => GameOutcome::Win(Player::Black),
            std::cmp::Ordering::Equal => GameOutcome::Draw,
        }
    }

    /// The winner if the game is over, `None` otherwise
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.is_finished().then(|| self.winner())
    }

    /// Canonical board code
    pub fn encode(&self) -> BoardCode {
        let value = self
            .cells
            .iter()
            .fold(0u128, |acc, cell| (acc << 2) | cell.code());
        BoardCode(value)
    }

    /// Inverse of [`Board::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoardCode`] when the code uses bits beyond the
    /// board or contains the unused 2-bit value `3`.
    pub fn decode(code: BoardCode, size: BoardSize) -> Result<Board> {
        let invalid = |reason| Error::InvalidBoardCode {
            code: code.0,
            rows: size.rows(),
            cols: size.cols(),
            reason,
        };

        let bits = 2 * size.cells() as u32;
        if code.0.checked_shr(bits).unwrap_or(0) != 0 {
            return Err(invalid("code has bits beyond the last cell"));
        }

        let mut cells = vec![Cell::Empty; size.cells()];
        let mut rest = code.0;
        for cell in cells.iter_mut().rev() {
            *cell = Cell::from_code(rest & 0b11).ok_or_else(|| invalid("cell code 3 is unused"))?;
            rest >>= 2;
        }
        Ok(Board { size, cells })
    }

    /// Board seen from `side`: identity for White, colours swapped for Black.
    ///
    /// Applying the same view twice returns the original board.
    #[must_use = "relative_view returns a new board; the original is unchanged"]
    pub fn relative_view(&self, side: Player) -> Board {
        match side {
            Player::White => self.clone(),
            Player::Black => Board {
                size: self.size,
                cells: self.cells.iter().map(|c| c.swapped()).collect(),
            },
        }
    }

    /// Convert a relative board back to absolute colours for `side`
    #[must_use = "absolute_view returns a new board; the original is unchanged"]
    pub fn absolute_view(&self, side: Player) -> Board {
        self.relative_view(side)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size.cols()) {
            let line: String = row.iter().map(|c| c.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
