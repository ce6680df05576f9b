use crate::{game::Game, moves::Move};

/// Pure perft node count.
/// Counts all legal positions from the current one down to `depth`.
pub fn perft(game: &mut Game, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    fn inner(game: &mut Game, depth: u8, layers: &mut [Vec<Move>]) -> u64 {
        if depth == 0 {
            return 1;
        }

        let (buf, rest) = layers
            .split_first_mut()
            .expect("perft requires one buffer per remaining ply");

        game.legal_moves_into(buf);

        let mut nodes = 0u64;
        for mv in buf.iter().copied() {
            if game.play(mv).is_ok() {
                nodes += inner(game, depth - 1, rest);
                let _ = game.unmake_move();
            }
        }
        nodes
    }

    let mut layers = vec![Vec::with_capacity(64); depth as usize];
    inner(game, depth, &mut layers[..])
}
