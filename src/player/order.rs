use rand::seq::SliceRandom;

/// Order in which the playlist is traversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOrder {
    /// Playlist order, `len` tracks.
    Identity(usize),
    /// A permutation of `0..len`.
    Shuffled(Vec<usize>),
}

impl PlayOrder {
    pub fn identity(len: usize) -> Self {
        Self::Identity(len)
    }

    /// Fresh uniform permutation of `0..len`.
    pub fn shuffled(len: usize) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rand::rng());
        Self::Shuffled(order)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Identity(len) => *len,
            Self::Shuffled(order) => order.len(),
        }
    }

    pub fn is_shuffled(&self) -> bool {
        matches!(self, Self::Shuffled(_))
    }

    /// Playlist index of the track at `position`. `position` must be `< len`.
    pub fn track_index(&self, position: usize) -> usize {
        match self {
            Self::Identity(_) => position,
            Self::Shuffled(order) => order[position],
        }
    }

    #[cfg(test)]
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Self::Identity(len) => (0..*len).collect(),
            Self::Shuffled(order) => order.clone(),
        }
    }

    /// Position after `position`, wrapping to the first.
    pub fn next_position(&self, position: usize) -> usize {
        (position + 1) % self.len()
    }

    /// Position before `position`, wrapping to the last.
    pub fn previous_position(&self, position: usize) -> usize {
        (position + self.len() - 1) % self.len()
    }
}
