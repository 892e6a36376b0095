//! Property tests for board and rotation invariants.

use proptest::prelude::*;

use blockfall::board::{cells_at, Board, CellState, Position};
use blockfall::piece::{ActivePiece, PieceController};
use blockfall::shape::{rotate, Rotation, Shape, ShapeCatalogue, ShapeKind};

const WIDTH: usize = 8;
const HEIGHT: usize = 12;

fn kind() -> impl Strategy<Value = ShapeKind> {
    prop::sample::select(ShapeKind::ALL.to_vec())
}

fn rotation() -> impl Strategy<Value = Rotation> {
    prop::sample::select(vec![
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ])
}

/// Random board where roughly one row in three is full.
fn board() -> impl Strategy<Value = Board> {
    prop::collection::vec((any::<bool>(), prop::collection::vec(any::<bool>(), WIDTH)), HEIGHT)
        .prop_map(|rows| {
            let grid = rows
                .into_iter()
                .map(|(full, cells)| {
                    cells
                        .into_iter()
                        .map(|filled| {
                            if full || filled {
                                CellState::Filled(ShapeKind::T)
                            } else {
                                CellState::Empty
                            }
                        })
                        .collect()
                })
                .collect();
            Board::from_rows(grid).unwrap()
        })
}

proptest! {
    #[test]
    fn clearing_keeps_dimensions_and_survivor_order(mut board in board()) {
        let survivors: Vec<Vec<CellState>> = board
            .rows()
            .iter()
            .filter(|row| !row.iter().all(|c| c.is_filled()))
            .cloned()
            .collect();

        let cleared = board.clear_completed_rows();

        prop_assert_eq!(board.rows().len(), HEIGHT);
        prop_assert!(board.rows().iter().all(|row| row.len() == WIDTH));
        prop_assert_eq!(cleared + survivors.len(), HEIGHT);
        prop_assert!(board.rows()[..cleared].iter().flatten().all(|c| !c.is_filled()));
        prop_assert_eq!(&board.rows()[cleared..], &survivors[..]);
    }

    #[test]
    fn full_turn_returns_to_base(kind in kind(), start in rotation()) {
        let shape = Shape::standard(kind);
        let mut m = shape.oriented(start);
        for _ in 0..4 {
            m = rotate(&m, Rotation::Deg90);
        }
        prop_assert_eq!(m, shape.oriented(start));
    }

    #[test]
    fn out_of_bounds_cells_are_rejected(
        kind in kind(),
        rot in rotation(),
        x in -6i16..(WIDTH as i16 + 6),
        y in -6i16..(HEIGHT as i16 + 6),
    ) {
        let board = Board::new(WIDTH, HEIGHT).unwrap();
        let matrix = Shape::standard(kind).oriented(rot);
        let out_of_bounds = cells_at(&matrix, Position::new(x, y))
            .any(|p| p.x < 0 || p.x >= WIDTH as i16 || p.y >= HEIGHT as i16);

        prop_assert_eq!(board.is_valid_placement(&matrix, Position::new(x, y)), !out_of_bounds);
    }

    #[test]
    fn rejected_requests_leave_piece_untouched(
        board in board(),
        kind in kind(),
        x in -2i16..(WIDTH as i16),
        y in 0i16..(HEIGHT as i16),
        moves in prop::collection::vec(0u8..4, 1..40),
    ) {
        let piece = ActivePiece::new_at(Shape::standard(kind), x, y);
        let mut controller = PieceController::with_piece(WIDTH, piece);

        for m in moves {
            let before = controller.active().clone();
            let accepted = match m {
                0 => controller.try_move(&board, -1, 0),
                1 => controller.try_move(&board, 1, 0),
                2 => controller.try_move(&board, 0, 1),
                _ => controller.try_rotate(&board),
            };
            if !accepted {
                prop_assert_eq!(controller.active(), &before);
            } else {
                let active = controller.active();
                prop_assert!(board.is_valid_placement(active.matrix(), active.position));
            }
        }
    }

    #[test]
    fn catalogue_draws_stay_in_catalogue(seed in any::<u64>()) {
        use rand::{rngs::StdRng, SeedableRng};

        let catalogue = ShapeCatalogue::standard();
        let mut rng = StdRng::seed_from_u64(seed);
        let shape = catalogue.choose(&mut rng);
        prop_assert!(catalogue.all_shapes().contains(shape));
    }
}
