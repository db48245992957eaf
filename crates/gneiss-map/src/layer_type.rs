use serde::{Deserialize, Serialize};

/// The kind of projective layer the map integrates depth into.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ProjectiveLayerType {
    #[default]
    Tsdf,
    Occupancy,
    /// A TSDF layer that also classifies free space.
    TsdfWithFreespace,
    None,
}

impl ProjectiveLayerType {
    /// Only layers with freespace capability feed the freespace update set.
    pub const fn has_freespace(self) -> bool {
        matches!(self, Self::TsdfWithFreespace)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_tsdf_with_freespace_has_freespace() {
        assert!(ProjectiveLayerType::TsdfWithFreespace.has_freespace());
        assert!(!ProjectiveLayerType::Tsdf.has_freespace());
        assert!(!ProjectiveLayerType::Occupancy.has_freespace());
        assert!(!ProjectiveLayerType::None.has_freespace());
    }
}
