use chess_engine::{uci, xboard};

/// Dispatch between the UCI and `XBoard` protocols.
///
/// GUIs that speak `XBoard`/CECP send `xboard` as their first line; everything
/// else (including silence, for engines launched without a handshake) falls
/// back to UCI, matching how most engines auto-detect the active protocol.
fn main() {
    if std::env::args().any(|arg| arg == "--xboard") {
        xboard::run_xboard();
    } else {
        uci::run_uci_loop();
    }
}
