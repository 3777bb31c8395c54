//! Random-move scrambles for the WCA events.
//!
//! The timer core never reads scrambles; they are opaque text attached to
//! each solve.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Stored in place of a scramble when generation fails
pub const SCRAMBLE_ERROR_PLACEHOLDER: &str = "Error generating scramble";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrambleError {
    #[error("no scrambler for event `{0}`")]
    UnsupportedEvent(String),
}

/// Supplies a scramble for an event id
pub trait ScrambleProvider {
    fn scramble(&mut self, event_id: &str) -> Result<String, ScrambleError>;
}

/// Ask `provider` for a scramble, falling back to the placeholder text
pub fn scramble_or_placeholder<P: ScrambleProvider + ?Sized>(
    provider: &mut P,
    event_id: &str,
) -> String {
    match provider.scramble(event_id) {
        Ok(scramble) => scramble,
        Err(e) => {
            tracing::warn!(error = %e, event_id, "scramble generation failed");
            SCRAMBLE_ERROR_PLACEHOLDER.to_string()
        }
    }
}

const SUFFIXES: [&str; 3] = ["", "'", "2"];
const SQ1_TWISTS: usize = 12;
const MINX_LINES: usize = 7;

pub struct RandomMoveScrambler<R: Rng> {
    rng: R,
}

impl RandomMoveScrambler<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible scrambles, for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomMoveScrambler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ScrambleProvider for RandomMoveScrambler<R> {
    fn scramble(&mut self, event_id: &str) -> Result<String, ScrambleError> {
        let scramble = match event_id {
            "222" => self.cube(2, 11),
            "333" | "333bf" | "333oh" | "333fm" => self.cube(3, 20),
            "444" | "444bf" => self.cube(4, 40),
            "555" | "555bf" => self.cube(5, 60),
            "666" => self.cube(6, 80),
            "777" => self.cube(7, 100),
            "pyram" => self.pyraminx(),
            "skewb" => self.skewb(),
            "minx" => self.megaminx(),
            "clock" => self.clock(),
            "sq1" => self.square_one(),
            other => return Err(ScrambleError::UnsupportedEvent(other.to_string())),
        };
        Ok(scramble)
    }
}

/// A face turn on an NxN cube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Turn {
    axis: usize,
    face: usize,
    depth: usize,
}

impl<R: Rng> RandomMoveScrambler<R> {
    fn suffix(&mut self) -> &'static str {
        SUFFIXES[self.rng.gen_range(0..SUFFIXES.len())]
    }

    fn prime(&mut self) -> &'static str {
        if self.rng.gen_bool(0.5) {
            ""
        } else {
            "'"
        }
    }

    /// Random turns with no repeated (face, depth) within a run on one axis,
    /// which rules out both `R R` and `R L R`.
    fn cube(&mut self, size: usize, length: usize) -> String {
        const FACES: [[&str; 2]; 3] = [["R", "L"], ["U", "D"], ["F", "B"]];

        let max_depth = size / 2;
        let mut candidates = Vec::new();
        for axis in 0..3 {
            for face in 0..2 {
                // 2x2 only needs three faces
                if size == 2 && face == 1 {
                    continue;
                }
                for depth in 1..=max_depth.max(1) {
                    // On even cubes the half-depth turn from the far side is redundant
                    if size % 2 == 0 && depth == max_depth && face == 1 && size > 2 {
                        continue;
                    }
                    candidates.push(Turn { axis, face, depth });
                }
            }
        }

        let mut run: Vec<Turn> = Vec::new();
        let mut moves = Vec::with_capacity(length);
        while moves.len() < length {
            let Some(&turn) = candidates.choose(&mut self.rng) else {
                break;
            };
            let same_axis = run.first().is_some_and(|t| t.axis == turn.axis);
            if same_axis && run.iter().any(|t| t.face == turn.face && t.depth == turn.depth) {
                continue;
            }
            if !same_axis {
                run.clear();
            }
            run.push(turn);

            let face = FACES[turn.axis][turn.face];
            let name = match turn.depth {
                1 => face.to_string(),
                2 => format!("{face}w"),
                d => format!("{d}{face}w"),
            };
            moves.push(format!("{name}{}", self.suffix()));
        }
        moves.join(" ")
    }

    fn no_repeat_faces(&mut self, faces: &[&str], length: usize) -> Vec<String> {
        let mut last: Option<&str> = None;
        let mut moves = Vec::with_capacity(length);
        while moves.len() < length {
            let Some(&face) = faces.choose(&mut self.rng) else {
                break;
            };
            if last == Some(face) {
                continue;
            }
            last = Some(face);
            moves.push(format!("{face}{}", self.prime()));
        }
        moves
    }

    fn pyraminx(&mut self) -> String {
        let mut moves = self.no_repeat_faces(&["U", "L", "R", "B"], 11);
        for tip in ["u", "l", "r", "b"] {
            match self.rng.gen_range(0..3) {
                0 => {}
                1 => moves.push(tip.to_string()),
                _ => moves.push(format!("{tip}'")),
            }
        }
        moves.join(" ")
    }

    fn skewb(&mut self) -> String {
        self.no_repeat_faces(&["R", "U", "L", "B"], 11).join(" ")
    }

    fn megaminx(&mut self) -> String {
        let mut lines = Vec::with_capacity(MINX_LINES);
        for _ in 0..MINX_LINES {
            let mut line = Vec::with_capacity(11);
            for i in 0..10 {
                let face = if i % 2 == 0 { "R" } else { "D" };
                let turn = if self.rng.gen_bool(0.5) { "++" } else { "--" };
                line.push(format!("{face}{turn}"));
            }
            line.push(format!("U{}", self.prime()));
            lines.push(line.join(" "));
        }
        lines.join("\n")
    }

    fn clock_turn(&mut self, pins: &str) -> String {
        let amount: i32 = self.rng.gen_range(-5..=6);
        if amount >= 0 {
            format!("{pins}{amount}+")
        } else {
            format!("{pins}{}-", -amount)
        }
    }

    fn clock(&mut self) -> String {
        let mut moves = Vec::new();
        for pins in ["UR", "DR", "DL", "UL", "U", "R", "D", "L", "ALL"] {
            moves.push(self.clock_turn(pins));
        }
        moves.push("y2".to_string());
        for pins in ["U", "R", "D", "L", "ALL"] {
            moves.push(self.clock_turn(pins));
        }
        for pin in ["UR", "DR", "DL", "UL"] {
            if self.rng.gen_bool(0.5) {
                moves.push(pin.to_string());
            }
        }
        moves.join(" ")
    }

    /// `(u,d)/` moves that keep both layers twistable
    fn square_one(&mut self) -> String {
        let mut puzzle = SquareOne::solved();
        let mut moves = Vec::with_capacity(SQ1_TWISTS);
        while moves.len() < SQ1_TWISTS {
            let top: i32 = self.rng.gen_range(-5..=6);
            let bottom: i32 = self.rng.gen_range(-5..=6);
            if top == 0 && bottom == 0 {
                continue;
            }
            if let Some(next) = puzzle.turned(top, bottom) {
                puzzle = next.twisted();
                moves.push(format!("({top},{bottom})/"));
            }
        }
        moves.join(" ")
    }
}

/// Square-1 layers as 12 slots of 30 degrees; a corner fills two slots
/// with the same piece id, an edge fills one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SquareOne {
    top: [u8; 12],
    bottom: [u8; 12],
}

impl SquareOne {
    fn solved() -> Self {
        Self {
            top: [0, 0, 1, 2, 2, 3, 4, 4, 5, 6, 6, 7],
            bottom: [8, 9, 9, 10, 11, 11, 12, 13, 13, 14, 15, 15],
        }
    }

    fn rotate(layer: [u8; 12], by: i32) -> [u8; 12] {
        let mut out = [0; 12];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = layer[(i as i32 - by).rem_euclid(12) as usize];
        }
        out
    }

    fn can_twist(layer: &[u8; 12]) -> bool {
        layer[11] != layer[0] && layer[5] != layer[6]
    }

    /// Rotate both layers, or `None` if the slice could not turn afterwards
    fn turned(&self, top: i32, bottom: i32) -> Option<Self> {
        let next = Self {
            top: Self::rotate(self.top, top),
            bottom: Self::rotate(self.bottom, bottom),
        };
        (Self::can_twist(&next.top) && Self::can_twist(&next.bottom)).then_some(next)
    }

    /// Swap the right halves of the two layers
    fn twisted(&self) -> Self {
        let mut next = *self;
        next.top[6..].copy_from_slice(&self.bottom[6..]);
        next.bottom[6..].copy_from_slice(&self.top[6..]);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WCA_EVENTS;

    fn scrambler() -> RandomMoveScrambler<StdRng> {
        RandomMoveScrambler::seeded(42)
    }

    #[test]
    fn every_wca_event_has_a_scramble() {
        let mut s = scrambler();
        for event in WCA_EVENTS.iter() {
            let scramble = s.scramble(event.id).unwrap();
            assert!(!scramble.is_empty(), "empty scramble for {}", event.id);
        }
    }

    #[test]
    fn cube_lengths() {
        let mut s = scrambler();
        assert_eq!(s.scramble("222").unwrap().split(' ').count(), 11);
        assert_eq!(s.scramble("333").unwrap().split(' ').count(), 20);
        assert_eq!(s.scramble("777").unwrap().split(' ').count(), 100);
    }

    #[test]
    fn cube_never_repeats_a_face() {
        let mut s = scrambler();
        for _ in 0..50 {
            let scramble = s.scramble("333").unwrap();
            let faces: Vec<char> = scramble
                .split(' ')
                .map(|m| m.chars().next().unwrap())
                .collect();
            for pair in faces.windows(2) {
                assert_ne!(pair[0], pair[1], "repeated face in {scramble}");
            }
            for triple in faces.windows(3) {
                assert!(
                    !(triple[0] == triple[2] && axis(triple[0]) == axis(triple[1])),
                    "same-axis sandwich in {scramble}"
                );
            }
        }
    }

    fn axis(face: char) -> usize {
        match face {
            'R' | 'L' => 0,
            'U' | 'D' => 1,
            _ => 2,
        }
    }

    #[test]
    fn two_by_two_uses_three_faces() {
        let mut s = scrambler();
        let scramble = s.scramble("222").unwrap();
        assert!(scramble
            .split(' ')
            .all(|m| matches!(m.chars().next(), Some('R' | 'U' | 'F'))));
    }

    #[test]
    fn big_cubes_use_wide_moves() {
        let mut s = scrambler();
        let scramble = s.scramble("777").unwrap();
        assert!(scramble.contains('w'));
        assert!(!s.scramble("333").unwrap().contains('w'));
    }

    #[test]
    fn megaminx_has_seven_lines_ending_in_u() {
        let scramble = scrambler().scramble("minx").unwrap();
        let lines: Vec<&str> = scramble.lines().collect();
        assert_eq!(lines.len(), 7);
        for line in lines {
            assert!(line.ends_with('U') || line.ends_with("U'"));
            assert_eq!(line.split(' ').count(), 11);
        }
    }

    #[test]
    fn clock_has_y2_in_the_middle() {
        let scramble = scrambler().scramble("clock").unwrap();
        let moves: Vec<&str> = scramble.split(' ').collect();
        assert_eq!(moves[9], "y2");
        assert!(moves[0].starts_with("UR"));
    }

    #[test]
    fn square_one_moves_are_twistable() {
        let scramble = scrambler().scramble("sq1").unwrap();
        let mut puzzle = SquareOne::solved();
        for m in scramble.split(' ') {
            let inner = m.trim_start_matches('(').trim_end_matches(")/");
            let (u, d) = inner.split_once(',').unwrap();
            let next = puzzle
                .turned(u.parse().unwrap(), d.parse().unwrap())
                .expect("illegal square-1 move");
            puzzle = next.twisted();
        }
        assert_eq!(scramble.split(' ').count(), SQ1_TWISTS);
    }

    #[test]
    fn solved_square_one_can_twist() {
        let p = SquareOne::solved();
        assert!(SquareOne::can_twist(&p.top));
        assert!(SquareOne::can_twist(&p.bottom));
        assert!(p.turned(1, 0).is_some());
        assert!(p.turned(3, 0).is_some());
        // splits the corner that sat in slots 9 and 10
        assert!(p.turned(2, 0).is_none());
        assert!(p.turned(0, 1).is_none());
    }

    #[test]
    fn unsupported_event_falls_back_to_placeholder() {
        let mut s = scrambler();
        assert_eq!(
            s.scramble("333mbf"),
            Err(ScrambleError::UnsupportedEvent("333mbf".to_string()))
        );
        assert_eq!(
            scramble_or_placeholder(&mut s, "333mbf"),
            SCRAMBLE_ERROR_PLACEHOLDER
        );
    }

    #[test]
    fn seeded_scrambles_repeat() {
        let a = RandomMoveScrambler::seeded(7).scramble("333").unwrap();
        let b = RandomMoveScrambler::seeded(7).scramble("333").unwrap();
        assert_eq!(a, b);
    }
}
