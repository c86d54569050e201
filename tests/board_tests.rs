use chess_engine::board::{Board, Move, Square};

#[test]
fn perft_positions() {
    struct TestPosition {
        name: &'static str,
        fen: &'static str,
        depths: &'static [(usize, u64)],
    }

    const TEST_POSITIONS: &[TestPosition] = &[
        TestPosition {
            name: "Initial Position",
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            depths: &[(1, 20), (2, 400), (3, 8902), (4, 197281), (5, 4865609)],
        },
        TestPosition {
            name: "Kiwipete",
            fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            depths: &[(1, 48), (2, 2039), (3, 97862), (4, 4085603)],
        },
    ];

    for position in TEST_POSITIONS {
        let mut board = Board::from_fen(position.fen);
        for &(depth, expected) in position.depths {
            let nodes = board.perft(depth);
            assert_eq!(
                nodes, expected,
                "Perft failed for {} at depth {}",
                position.name, depth
            );
        }
    }
}

#[test]
fn test_draw_detection_50_move() {
    // Halfmove clock already at 99; one more quiet move should trip the rule.
    let mut board = Board::from_fen("8/8/8/8/8/8/8/K6k w - - 99 1");
    let mv = Move::quiet(Square::new(0, 0), Square::new(0, 1));
    let info = board.make_move(mv);
    assert!(board.is_draw());
    board.unmake_move(mv, info);
    assert_eq!(board.halfmove_clock(), 99);
}

#[test]
fn test_checkmate_and_stalemate_detection() {
    let mut mated = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5KR b - - 0 1");
    assert!(mated.is_checkmate());

    let mut stalemated = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    assert!(stalemated.is_stalemate());
}
