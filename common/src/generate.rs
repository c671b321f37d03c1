//! Mine placement.
//!
//! Mines are placed lazily, once the first reveal is known, so that the opening move is
//! always safe. The random source is passed in; games derive it from their seed.

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::field::{Field, Point};

/// How many layouts no-guess generation shuffles before settling for the last one.
pub const MAX_GENERATION_ATTEMPTS: u32 = 1000;

/// The cells kept free of mines around the opening move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeZone {
    /// Only the opening cell.
    Cell,
    /// The opening cell and its neighbors, if enough cells remain for the mines.
    Neighborhood,
}

/// Scatters the field's mines uniformly over every cell outside the safe zone around
/// `excluded`.
///
/// Panics if the field cannot hold its mines or was already mined: both are caller bugs,
/// since preferences are validated before a field exists and placement is gated on the
/// game's first reveal.
pub fn place_mines<R: Rng + ?Sized>(
    field: &mut Field,
    excluded: Point,
    zone: SafeZone,
    rng: &mut R,
) {
    let mines = field.mine_count();
    assert!(
        mines < field.cells(),
        "Too many mines for the given field size: {}x{} with {} mines",
        field.width(),
        field.height(),
        mines
    );
    assert!(!field.is_mined(), "Mines can only be placed once per field");

    let mut safe = vec![excluded];
    if zone == SafeZone::Neighborhood {
        safe.extend(field.neighbors(excluded));
        if field.cells() - safe.len() < mines {
            debug!(mines, "no room for a safe neighborhood, keeping only the opening cell free");
            safe.truncate(1);
        }
    }

    let mut positions: Vec<Point> = field.points().filter(|p| !safe.contains(p)).collect();
    positions.shuffle(rng);

    for point in positions.into_iter().take(mines) {
        field[point].mine = true;
    }
    field.mark_mined();
}

/// Result of [`generate_solvable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    /// Layouts tried, including the one kept.
    pub attempts: u32,
    /// Whether the kept layout passed the solvability check.
    pub solvable: bool,
}

/// Reshuffles layouts for an unmined field until `is_solvable` accepts one opened at
/// `opening`, or `max_attempts` layouts have been tried. The last layout is kept either way.
pub fn generate_solvable<R, F>(
    field: &mut Field,
    opening: Point,
    rng: &mut R,
    max_attempts: u32,
    mut is_solvable: F,
) -> Generation
where
    R: Rng + ?Sized,
    F: FnMut(&Field, Point) -> bool,
{
    let empty = field.clone();
    let mut attempts = 0;

    loop {
        attempts += 1;

        let mut candidate = empty.clone();
        place_mines(&mut candidate, opening, SafeZone::Neighborhood, rng);
        let solvable = is_solvable(&candidate, opening);

        if solvable || attempts >= max_attempts {
            debug!(attempts, solvable, "generated field");
            *field = candidate;
            return Generation {
                attempts,
                solvable,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn test_place_mines_count() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut field = Field::new(30, 16, 99);
        place_mines(&mut field, Point::new(15, 8), SafeZone::Cell, &mut rng);

        assert!(field.is_mined());
        let placed = field.points().filter(|&p| field[p].mine).count();
        assert_eq!(placed, 99);
        assert!(!field[Point::new(15, 8)].mine);
    }

    #[test]
    fn test_dense_field_leaves_only_the_excluded_cell() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut field = Field::new(3, 3, 8);
        place_mines(&mut field, Point::new(1, 1), SafeZone::Cell, &mut rng);

        for point in field.points() {
            assert_eq!(field[point].mine, point != Point::new(1, 1));
        }
    }

    #[test]
    fn test_neighborhood_zone_is_mine_free() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let mut field = Field::new(10, 10, 20);
            place_mines(&mut field, Point::new(5, 5), SafeZone::Neighborhood, &mut rng);

            assert_eq!(field.adjacent_mines(Point::new(5, 5)), 0);
            assert!(!field[Point::new(5, 5)].mine);
        }
    }

    #[test]
    fn test_neighborhood_zone_falls_back_when_crowded() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut field = Field::new(3, 3, 5);
        place_mines(&mut field, Point::new(1, 1), SafeZone::Neighborhood, &mut rng);

        assert!(!field[Point::new(1, 1)].mine);
        assert_eq!(field.adjacent_mines(Point::new(1, 1)), 5);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let layout = |seed| {
            let mut field = Field::new(9, 9, 10);
            place_mines(
                &mut field,
                Point::new(4, 4),
                SafeZone::Cell,
                &mut SmallRng::seed_from_u64(seed),
            );
            field
        };
        assert_eq!(layout(11), layout(11));
    }

    #[test]
    #[should_panic(expected = "Too many mines for the given field size: 3x3 with 9 mines")]
    fn test_place_mines_too_many() {
        let mut field = Field::new(3, 3, 9);
        place_mines(
            &mut field,
            Point::new(0, 0),
            SafeZone::Cell,
            &mut SmallRng::seed_from_u64(0),
        );
    }

    #[test]
    #[should_panic(expected = "Mines can only be placed once per field")]
    fn test_place_mines_twice() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut field = Field::new(3, 3, 1);
        place_mines(&mut field, Point::new(0, 0), SafeZone::Cell, &mut rng);
        place_mines(&mut field, Point::new(0, 0), SafeZone::Cell, &mut rng);
    }

    #[test]
    fn test_generate_solvable_accepts_first_layout() {
        let mut field = Field::new(5, 5, 3);
        let mut rng = SmallRng::seed_from_u64(1);
        let generation = generate_solvable(&mut field, Point::new(2, 2), &mut rng, 100, |_, _| true);

        assert_eq!(
            generation,
            Generation {
                attempts: 1,
                solvable: true
            }
        );
        assert!(field.is_mined());
    }

    #[test]
    fn test_generate_solvable_gives_up_after_max_attempts() {
        let mut field = Field::new(5, 5, 3);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut checks = 0;
        let generation = generate_solvable(&mut field, Point::new(2, 2), &mut rng, 10, |_, _| {
            checks += 1;
            false
        });

        assert_eq!(generation.attempts, 10);
        assert!(!generation.solvable);
        assert_eq!(checks, 10);
        assert_eq!(field.points().filter(|&p| field[p].mine).count(), 3);
    }
}
