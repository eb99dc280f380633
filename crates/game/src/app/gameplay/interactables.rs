use fallhouse_engine::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InteractableKind {
    Part,
    Key,
    CraftingTable,
    Furniture,
    Vent,
}

impl InteractableKind {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Part => "part",
            Self::Key => "key",
            Self::CraftingTable => "crafting_table",
            Self::Furniture => "furniture",
            Self::Vent => "vent",
        }
    }

    /// Whether a successful use retires the entry. The crafting table stays
    /// live so later attempts are checked and reported.
    pub(crate) fn consumed_on_use(self) -> bool {
        !matches!(self, Self::CraftingTable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct InteractableId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Interactable {
    pub(crate) id: InteractableId,
    pub(crate) kind: InteractableKind,
    pub(crate) node: NodeId,
    pub(crate) radius: f32,
    pub(crate) triggered: bool,
}

/// Interactables in registration order. Registration order is also the order
/// the resolver applies simultaneous matches in.
#[derive(Debug, Default)]
pub(crate) struct InteractableRegistry {
    next_id: u32,
    entries: Vec<Interactable>,
}

impl InteractableRegistry {
    pub(crate) fn register(
        &mut self,
        kind: InteractableKind,
        node: NodeId,
        radius: f32,
    ) -> InteractableId {
        let id = InteractableId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push(Interactable {
            id,
            kind,
            node,
            radius,
            triggered: false,
        });
        id
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: InteractableId) -> Option<&Interactable> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Flags the entry as used. Returns false if it was already triggered.
    pub(crate) fn mark_triggered(&mut self, id: InteractableId) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) if !entry.triggered => {
                entry.triggered = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn pending(&self) -> impl Iterator<Item = &Interactable> {
        self.entries.iter().filter(|entry| !entry.triggered)
    }

    #[cfg(test)]
    pub(crate) fn first_of_kind(&self, kind: InteractableKind) -> Option<&Interactable> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    #[cfg(test)]
    pub(crate) fn of_kind(&self, kind: InteractableKind) -> impl Iterator<Item = &Interactable> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}
