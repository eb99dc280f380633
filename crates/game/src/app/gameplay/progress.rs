/// Inventory and control flags for one play session.
///
/// Quest fields only move forward (`collected_parts` grows, the booleans flip
/// false to true) until [`PlayerProgress::reset`]. `flashlight_on` and
/// `can_move` are toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PlayerProgress {
    has_key: bool,
    collected_parts: u32,
    crafted: bool,
    holding_hand: bool,
    path_cleared: bool,
    flashlight_on: bool,
    can_move: bool,
}

impl PlayerProgress {
    pub(crate) fn has_key(&self) -> bool {
        self.has_key
    }

    pub(crate) fn collected_parts(&self) -> u32 {
        self.collected_parts
    }

    pub(crate) fn crafted(&self) -> bool {
        self.crafted
    }

    pub(crate) fn holding_hand(&self) -> bool {
        self.holding_hand
    }

    pub(crate) fn path_cleared(&self) -> bool {
        self.path_cleared
    }

    pub(crate) fn flashlight_on(&self) -> bool {
        self.flashlight_on
    }

    pub(crate) fn can_move(&self) -> bool {
        self.can_move
    }

    pub(crate) fn collect_part(&mut self) -> u32 {
        self.collected_parts = self.collected_parts.saturating_add(1);
        self.collected_parts
    }

    pub(crate) fn take_key(&mut self) {
        self.has_key = true;
    }

    pub(crate) fn mark_crafted(&mut self) {
        self.crafted = true;
        self.holding_hand = true;
    }

    pub(crate) fn clear_path(&mut self) {
        self.path_cleared = true;
    }

    #[cfg(test)]
    pub(crate) fn set_flashlight(&mut self, on: bool) {
        self.flashlight_on = on;
    }

    pub(crate) fn toggle_flashlight(&mut self) -> bool {
        self.flashlight_on = !self.flashlight_on;
        self.flashlight_on
    }

    pub(crate) fn set_can_move(&mut self, can_move: bool) {
        self.can_move = can_move;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_count_only_grows_until_reset() {
        let mut progress = PlayerProgress::default();
        let mut last = progress.collected_parts();
        for _ in 0..5 {
            let next = progress.collect_part();
            assert!(next > last);
            last = next;
        }
        progress.reset();
        assert_eq!(progress.collected_parts(), 0);
    }

    #[test]
    fn crafting_puts_hand_in_player_grip() {
        let mut progress = PlayerProgress::default();
        assert!(!progress.holding_hand());
        progress.mark_crafted();
        assert!(progress.crafted());
        assert!(progress.holding_hand());
    }

    #[test]
    fn reset_clears_every_flag() {
        let mut progress = PlayerProgress::default();
        progress.take_key();
        progress.mark_crafted();
        progress.clear_path();
        progress.set_flashlight(true);
        progress.set_can_move(true);

        progress.reset();
        assert_eq!(progress, PlayerProgress::default());
    }
}
