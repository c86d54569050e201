use chess_engine::board::Board;
use chess_engine::uci::format_uci_move;
use std::time::Instant;

fn main() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut board = Board::from_fen(fen);
    let depth = 3;
    println!("Perft divide for Kiwipete depth {}", depth);
    let start = Instant::now();
    let mut divided = board.perft_divide(depth);
    divided.sort_by_key(|(m, _)| (m.from().as_index(), m.to().as_index()));

    let mut total = 0u64;
    for (m, nodes) in &divided {
        println!("  {}: {}", format_uci_move(m), nodes);
        total += nodes;
    }
    let dur = start.elapsed();
    println!("Total: {} in {:?}", total, dur);
}
