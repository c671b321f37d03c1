//! Complete deduction over what the player can see, backed by a SAT solver.
//!
//! Each revealed cell says "exactly N mines among my covered neighbors". Covered cells that
//! touch a revealed cell form the frontier and get one variable each. The rest, the
//! interior, are interchangeable: whatever the frontier does not hold of the mine counter
//! is spread over them, so they are decided together. A covered cell is forced when only
//! one of its two states is consistent with every constraint. Player flags are not trusted:
//! a flagged cell is just another covered cell.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::{
    error::{Error, Result},
    field::{Field, Point},
};

/// Above this many cells a cardinality constraint is encoded with a sequential counter
/// instead of one clause per combination.
const NAIVE_ENCODING_LIMIT: usize = 10;

/// "Exactly `mines` of these cells are mines."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub cells: Vec<Point>,
    pub mines: usize,
}

/// Everything the visible board says about the covered cells.
#[derive(Debug, Clone)]
pub struct Constraints {
    /// Covered cells next to a revealed cell, row-major.
    pub frontier: Vec<Point>,
    /// Covered cells with no revealed neighbor, row-major.
    pub interior: Vec<Point>,
    /// One per revealed cell that still touches a covered cell. Cells outside the frontier
    /// are ignored.
    pub local: Vec<Constraint>,
    /// The mine counter: mines among all covered cells.
    pub mines: usize,
}

impl Constraints {
    pub fn from_field(field: &Field) -> Self {
        let (frontier, interior): (Vec<Point>, Vec<Point>) = field
            .points()
            .filter(|&p| !field[p].revealed)
            .partition(|&p| field.neighbors(p).any(|n| field[n].revealed));

        let local = field
            .points()
            .filter(|&p| field[p].revealed)
            .filter_map(|p| {
                let cells: Vec<Point> = field.neighbors(p).filter(|&n| !field[n].revealed).collect();
                (!cells.is_empty()).then(|| Constraint {
                    cells,
                    mines: field.adjacent_mines(p),
                })
            })
            .collect();

        Constraints {
            frontier,
            interior,
            local,
            mines: field.mine_count(),
        }
    }
}

/// What the visible board proves about one covered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deduction {
    ForcedMine,
    ForcedSafe,
    Undetermined,
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub deductions: BTreeMap<Point, Deduction>,
}

impl Analysis {
    pub fn get(&self, point: Point) -> Option<Deduction> {
        self.deductions.get(&point).copied()
    }

    /// Provably safe cells, row-major.
    pub fn safe(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells_with(Deduction::ForcedSafe)
    }

    /// Provable mines, row-major.
    pub fn mines(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells_with(Deduction::ForcedMine)
    }

    fn cells_with(&self, wanted: Deduction) -> impl Iterator<Item = Point> + '_ {
        self.deductions
            .iter()
            .filter(move |&(_, &deduction)| deduction == wanted)
            .map(|(&point, _)| point)
    }
}

/// Classifies every covered cell of `field`.
///
/// Fails with [`Error::Unsatisfiable`] if the visible board is contradictory, which a field
/// built by this crate never is.
pub fn analyze(field: &Field) -> Result<Analysis> {
    analyze_constraints(&Constraints::from_field(field))
}

pub fn analyze_constraints(constraints: &Constraints) -> Result<Analysis> {
    let Constraints {
        frontier,
        interior,
        local,
        mines,
    } = constraints;
    let mines = *mines;

    let mut formula = CnfFormula::new();
    let vars: BTreeMap<Point, Var> = frontier
        .iter()
        .map(|&point| (point, formula.new_var()))
        .collect();
    let lit = |point: &Point| vars.get(point).map(|&v| Lit::from_var(v, true));

    for constraint in local {
        let lits: Vec<Lit> = constraint.cells.iter().filter_map(lit).collect();
        exactly(&mut Clauses::new(&mut formula), &lits, constraint.mines);
    }

    // The interior takes the rest of the counter: M - |interior| <= frontier mines <= M.
    let all: Vec<Lit> = frontier.iter().filter_map(lit).collect();
    let floor = mines.saturating_sub(interior.len());
    at_most(&mut Clauses::new(&mut formula), &all, mines);
    at_least(&mut Clauses::new(&mut formula), &all, floor);

    // Two switchable bounds decide the interior: the frontier leaving at least one mine
    // over, and the frontier holding enough that the interior is not all mines.
    let mut switches = None;
    if !interior.is_empty() {
        let spare = formula.new_lit();
        match mines.checked_sub(1) {
            Some(k) => at_most(&mut Clauses::guarded(&mut formula, spare), &all, k),
            None => formula.add_clause(&[!spare]),
        }
        let crowd_floor = (mines + 1).saturating_sub(interior.len());
        let roomy = formula.new_lit();
        at_least(&mut Clauses::guarded(&mut formula, roomy), &all, crowd_floor);
        switches = Some((spare, roomy, crowd_floor));
    }

    let mut solver = Solver::new();
    solver.add_formula(&formula);

    let mut witnesses = Witnesses::new();
    if !witnesses.solve(&mut solver, None, &vars)? {
        return Err(Error::Unsatisfiable);
    }

    // A cell seen both ways in some model is undetermined; only the unseen side needs a solve.
    let mut deductions = BTreeMap::new();
    for (&point, &var) in &vars {
        let as_mine = Lit::from_var(var, true);
        let seen = (witnesses.mine.contains(&point), witnesses.safe.contains(&point));
        let deduction = match seen {
            (true, true) => Deduction::Undetermined,
            (true, false) => {
                if witnesses.solve(&mut solver, Some(!as_mine), &vars)? {
                    Deduction::Undetermined
                } else {
                    Deduction::ForcedMine
                }
            }
            (false, _) => {
                if witnesses.solve(&mut solver, Some(as_mine), &vars)? {
                    Deduction::Undetermined
                } else {
                    Deduction::ForcedSafe
                }
            }
        };
        deductions.insert(point, deduction);
    }

    if let Some((spare, roomy, crowd_floor)) = switches {
        let can_hold_mine =
            witnesses.fewest < mines || witnesses.solve(&mut solver, Some(spare), &vars)?;
        let can_be_safe =
            witnesses.most >= crowd_floor || witnesses.solve(&mut solver, Some(roomy), &vars)?;

        let deduction = match (can_hold_mine, can_be_safe) {
            (true, false) => Deduction::ForcedMine,
            (false, true) => Deduction::ForcedSafe,
            _ => Deduction::Undetermined,
        };
        deductions.extend(interior.iter().map(|&point| (point, deduction)));
    }

    Ok(Analysis { deductions })
}

/// Frontier states observed across every model found so far.
struct Witnesses {
    mine: HashSet<Point>,
    safe: HashSet<Point>,
    /// Fewest and most frontier mines in any model.
    fewest: usize,
    most: usize,
}

impl Witnesses {
    fn new() -> Self {
        Witnesses {
            mine: HashSet::new(),
            safe: HashSet::new(),
            fewest: usize::MAX,
            most: 0,
        }
    }

    /// Solves under `assumption` and records the model, if there is one.
    fn solve(
        &mut self,
        solver: &mut Solver,
        assumption: Option<Lit>,
        vars: &BTreeMap<Point, Var>,
    ) -> Result<bool> {
        solver.assume(assumption.as_slice());
        let satisfiable = solver.solve()?;
        if satisfiable {
            let model: HashSet<Lit> = solver
                .model()
                .ok_or(Error::Unsatisfiable)?
                .into_iter()
                .collect();
            self.record(&model, vars);
        }
        solver.assume(&[]);
        Ok(satisfiable)
    }

    fn record(&mut self, model: &HashSet<Lit>, vars: &BTreeMap<Point, Var>) {
        let mut count = 0;
        for (&point, &var) in vars {
            if model.contains(&Lit::from_var(var, true)) {
                self.mine.insert(point);
                count += 1;
            } else {
                self.safe.insert(point);
            }
        }
        self.fewest = self.fewest.min(count);
        self.most = self.most.max(count);
    }
}

/// Clause sink; with a guard, each clause only binds when the guard is assumed true.
struct Clauses<'a> {
    formula: &'a mut CnfFormula,
    guard: Option<Lit>,
}

impl<'a> Clauses<'a> {
    fn new(formula: &'a mut CnfFormula) -> Self {
        Clauses {
            formula,
            guard: None,
        }
    }

    fn guarded(formula: &'a mut CnfFormula, guard: Lit) -> Self {
        Clauses {
            formula,
            guard: Some(guard),
        }
    }

    fn add(&mut self, clause: &[Lit]) {
        match self.guard {
            Some(guard) => {
                let mut clause = clause.to_vec();
                clause.push(!guard);
                self.formula.add_clause(&clause);
            }
            None => self.formula.add_clause(clause),
        }
    }

    fn new_lit(&mut self) -> Lit {
        self.formula.new_lit()
    }
}

fn exactly(clauses: &mut Clauses, lits: &[Lit], k: usize) {
    at_most(clauses, lits, k);
    at_least(clauses, lits, k);
}

fn at_most(clauses: &mut Clauses, lits: &[Lit], k: usize) {
    if k >= lits.len() {
        return;
    }
    if k == 0 {
        for &lit in lits {
            clauses.add(&[!lit]);
        }
        return;
    }

    if lits.len() <= NAIVE_ENCODING_LIMIT {
        // No k + 1 of them may all be mines.
        for combo in lits.iter().combinations(k + 1) {
            let clause: Vec<Lit> = combo.into_iter().map(|&lit| !lit).collect();
            clauses.add(&clause);
        }
    } else {
        sequential_counter(clauses, lits, k);
    }
}

fn at_least(clauses: &mut Clauses, lits: &[Lit], k: usize) {
    if k == 0 {
        return;
    }
    if k > lits.len() {
        clauses.add(&[]);
        return;
    }

    // At least k true is at most n - k false.
    let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
    at_most(clauses, &negated, lits.len() - k);
}

/// Sinz's sequential counter for "at most k", with `1 <= k < lits.len()`.
///
/// `s[i][j]` holds when at least `j + 1` of the first `i + 1` literals are true.
fn sequential_counter(clauses: &mut Clauses, lits: &[Lit], k: usize) {
    let n = lits.len();
    let mut s = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let row: Vec<Lit> = (0..k).map(|_| clauses.new_lit()).collect();
        s.push(row);
    }

    clauses.add(&[!lits[0], s[0][0]]);
    for j in 1..k {
        clauses.add(&[!s[0][j]]);
    }

    for i in 1..n - 1 {
        clauses.add(&[!lits[i], s[i][0]]);
        clauses.add(&[!s[i - 1][0], s[i][0]]);
        for j in 1..k {
            clauses.add(&[!lits[i], !s[i - 1][j - 1], s[i][j]]);
            clauses.add(&[!s[i - 1][j], s[i][j]]);
        }
        clauses.add(&[!lits[i], !s[i - 1][k - 1]]);
    }

    clauses.add(&[!lits[n - 1], !s[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generate::{SafeZone, place_mines},
        solver::try_solve,
        sweep::Trigger,
    };
    use rand::{SeedableRng, rngs::SmallRng};

    fn point(x: usize, y: usize) -> Point {
        Point { x, y }
    }

    #[test]
    fn test_constraint_building() {
        let mut field = Field::with_mines(3, 3, &[point(0, 0), point(2, 2)]);
        field[point(1, 1)].revealed = true;

        let Constraints {
            frontier,
            interior,
            local,
            mines,
        } = Constraints::from_field(&field);

        assert_eq!(frontier.len(), 8);
        assert!(interior.is_empty());
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].mines, 2);
        assert_eq!(local[0].cells, frontier);
        assert_eq!(mines, 2);
    }

    #[test]
    fn test_constraint_building_splits_off_the_interior() {
        let mut field = Field::with_mines(4, 4, &[point(0, 0)]);
        field.reveal(point(1, 1), Trigger::Player);

        let constraints = Constraints::from_field(&field);

        assert_eq!(constraints.frontier.len(), 8);
        assert_eq!(constraints.interior.len(), 7);
        assert!(constraints.interior.contains(&point(3, 0)));
        assert!(!constraints.interior.contains(&point(2, 2)));
    }

    #[test]
    fn test_symmetric_pair_is_undetermined() {
        let constraints = Constraints {
            frontier: vec![point(0, 0), point(0, 1)],
            interior: Vec::new(),
            local: vec![Constraint {
                cells: vec![point(0, 0), point(0, 1)],
                mines: 1,
            }],
            mines: 1,
        };

        let analysis = analyze_constraints(&constraints).unwrap();

        assert_eq!(analysis.get(point(0, 0)), Some(Deduction::Undetermined));
        assert_eq!(analysis.get(point(0, 1)), Some(Deduction::Undetermined));
    }

    #[test]
    fn test_corner_one_forces_the_corner() {
        // 2x2 with the mine at (0,0): (1,1) shows 1, and the global count of 1 with three
        // unknowns does not decide anything yet.
        let mut field = Field::with_mines(2, 2, &[point(0, 0)]);
        field.reveal(point(1, 1), Trigger::Player);
        let analysis = analyze(&field).unwrap();
        assert!(analysis.safe().next().is_none());

        field.reveal(point(1, 0), Trigger::Player);
        field.reveal(point(0, 1), Trigger::Player);
        let analysis = analyze(&field).unwrap();
        assert_eq!(analysis.mines().collect::<Vec<_>>(), vec![point(0, 0)]);
    }

    #[test]
    fn test_global_count_decides_interior_cells() {
        // 4x1 strip, mine at (0,0). Revealing (3,0) opens (2,0) and (1,0); (1,0) shows 1, and
        // the single remaining unknown is forced.
        let mut field = Field::with_mines(4, 1, &[point(0, 0)]);
        field.reveal(point(3, 0), Trigger::Player);
        let analysis = analyze(&field).unwrap();
        assert_eq!(analysis.get(point(0, 0)), Some(Deduction::ForcedMine));

        // With no frontier at all, zero mines makes the interior safe and a full count makes
        // it all mines.
        let mut constraints = Constraints {
            frontier: Vec::new(),
            interior: vec![point(0, 0), point(1, 0)],
            local: Vec::new(),
            mines: 0,
        };
        let analysis = analyze_constraints(&constraints).unwrap();
        assert_eq!(analysis.safe().count(), 2);

        constraints.mines = 2;
        let analysis = analyze_constraints(&constraints).unwrap();
        assert_eq!(analysis.mines().count(), 2);

        constraints.mines = 1;
        let analysis = analyze_constraints(&constraints).unwrap();
        assert_eq!(analysis.get(point(1, 0)), Some(Deduction::Undetermined));
    }

    #[test]
    fn test_interior_is_safe_once_the_frontier_holds_every_mine() {
        // (1,1) shows 1 and the counter says 1, so nothing is left for the interior.
        let mut field = Field::with_mines(4, 4, &[point(0, 0)]);
        field.reveal(point(1, 1), Trigger::Player);

        let analysis = analyze(&field).unwrap();

        for p in [point(3, 0), point(3, 3), point(0, 3)] {
            assert_eq!(analysis.get(p), Some(Deduction::ForcedSafe), "{p:?}");
        }
        assert_eq!(analysis.get(point(0, 0)), Some(Deduction::Undetermined));
        assert_eq!(analysis.get(point(2, 2)), Some(Deduction::Undetermined));
    }

    #[test]
    fn test_leftover_mines_fill_the_interior() {
        // The frontier pair holds exactly one mine, so the other two sit in the interior.
        let constraints = Constraints {
            frontier: vec![point(0, 0), point(1, 0)],
            interior: vec![point(5, 5), point(6, 5)],
            local: vec![Constraint {
                cells: vec![point(0, 0), point(1, 0)],
                mines: 1,
            }],
            mines: 3,
        };

        let analysis = analyze_constraints(&constraints).unwrap();

        assert_eq!(analysis.mines().collect::<Vec<_>>(), vec![point(5, 5), point(6, 5)]);
        assert_eq!(analysis.get(point(0, 0)), Some(Deduction::Undetermined));
        assert_eq!(analysis.get(point(1, 0)), Some(Deduction::Undetermined));
    }

    #[test]
    fn test_contradiction_is_an_error() {
        let constraints = Constraints {
            frontier: vec![point(0, 0)],
            interior: Vec::new(),
            local: vec![Constraint {
                cells: vec![point(0, 0)],
                mines: 2,
            }],
            mines: 1,
        };
        assert!(matches!(
            analyze_constraints(&constraints),
            Err(Error::Unsatisfiable)
        ));
    }

    #[test]
    fn test_sequential_counter_matches_exact_count() {
        // Twelve cells take the sequential-counter path; exactly 3 mines.
        let cells: Vec<Point> = (0..12).map(|x| point(x, 0)).collect();
        let mut constraints = Constraints {
            frontier: cells.clone(),
            interior: Vec::new(),
            local: vec![
                Constraint {
                    cells: cells[..9].to_vec(),
                    mines: 0,
                },
                Constraint {
                    cells: cells.clone(),
                    mines: 3,
                },
            ],
            mines: 3,
        };
        let analysis = analyze_constraints(&constraints).unwrap();
        assert_eq!(analysis.safe().count(), 9);
        assert_eq!(analysis.mines().collect::<Vec<_>>(), cells[9..].to_vec());

        constraints.local[0].mines = 1;
        let analysis = analyze_constraints(&constraints).unwrap();
        assert_eq!(analysis.mines().count(), 0);
        assert_eq!(analysis.safe().count(), 0);
    }

    #[test]
    fn test_rule_solver_deductions_are_provable() {
        let mut rng = SmallRng::seed_from_u64(99);

        for _ in 0..20 {
            let opening = point(3, 3);
            let mut field = Field::new(7, 7, 8);
            place_mines(&mut field, opening, SafeZone::Neighborhood, &mut rng);
            field.reveal(opening, Trigger::Player);
            let analysis = analyze(&field).unwrap();

            for (&point, &deduction) in &analysis.deductions {
                match deduction {
                    Deduction::ForcedMine => assert!(field[point].mine),
                    Deduction::ForcedSafe => assert!(!field[point].mine),
                    Deduction::Undetermined => {}
                }
            }

            // Every flag the rule solver plants is backed by numbers still on the board.
            let mut solved = field.clone();
            try_solve(&mut solved).unwrap();
            let after = analyze(&solved).unwrap();
            for point in solved.points().filter(|&p| solved[p].flagged) {
                assert_eq!(after.get(point), Some(Deduction::ForcedMine), "{point:?}");
            }
        }
    }
}
