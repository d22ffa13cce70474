use super::semantics::{
    standard_properties, ContainerKind, FIRST_SPECIFIC_TYPE_ID, GENERIC_COLOR_TYPE_ID,
    GENERIC_IDENTIFIER_TYPE_ID, GENERIC_SELECTION_TYPE_ID, GENERIC_TRANSPARENCY_TYPE_ID,
    GENERIC_TYPE_TYPE_ID,
};

standard_properties! {
    /// Standard properties of particle containers
    pub enum ParticleProperty {
        Type = GENERIC_TYPE_TYPE_ID => ("Particle Type", Int32, []),
        Selection = GENERIC_SELECTION_TYPE_ID => ("Selection", Int32, []),
        Color = GENERIC_COLOR_TYPE_ID => ("Color", Float, ["R", "G", "B"]),
        Identifier = GENERIC_IDENTIFIER_TYPE_ID => ("Particle Identifier", Int64, []),
        Transparency = GENERIC_TRANSPARENCY_TYPE_ID => ("Transparency", Float, []),
        Position = FIRST_SPECIFIC_TYPE_ID => ("Position", Float, ["X", "Y", "Z"]),
        Displacement = FIRST_SPECIFIC_TYPE_ID + 1 => ("Displacement", Float, ["X", "Y", "Z"]),
        DisplacementMagnitude = FIRST_SPECIFIC_TYPE_ID + 2 => ("Displacement Magnitude", Float, []),
        Velocity = FIRST_SPECIFIC_TYPE_ID + 3 => ("Velocity", Float, ["X", "Y", "Z"]),
        Force = FIRST_SPECIFIC_TYPE_ID + 4 => ("Force", Float, ["X", "Y", "Z"]),
        Mass = FIRST_SPECIFIC_TYPE_ID + 5 => ("Mass", Float, []),
        Charge = FIRST_SPECIFIC_TYPE_ID + 6 => ("Charge", Float, []),
        Radius = FIRST_SPECIFIC_TYPE_ID + 7 => ("Radius", Float, []),
        PotentialEnergy = FIRST_SPECIFIC_TYPE_ID + 8 => ("Potential Energy", Float, []),
        Cluster = FIRST_SPECIFIC_TYPE_ID + 9 => ("Cluster", Int64, []),
        Coordination = FIRST_SPECIFIC_TYPE_ID + 10 => ("Coordination", Int32, []),
        StructureType = FIRST_SPECIFIC_TYPE_ID + 11 => ("Structure Type", Int32, []),
        Orientation = FIRST_SPECIFIC_TYPE_ID + 12 => ("Orientation", Float, ["X", "Y", "Z", "W"]),
        StressTensor = FIRST_SPECIFIC_TYPE_ID + 13 => ("Stress Tensor", Float, ["XX", "YY", "ZZ", "XY", "XZ", "YZ"]),
        PeriodicImage = FIRST_SPECIFIC_TYPE_ID + 14 => ("Periodic Image", Int32, ["X", "Y", "Z"]),
        Molecule = FIRST_SPECIFIC_TYPE_ID + 15 => ("Molecule Identifier", Int64, []),
    }
}

standard_properties! {
    /// Standard properties of bond containers
    pub enum BondProperty {
        Type = GENERIC_TYPE_TYPE_ID => ("Bond Type", Int32, []),
        Selection = GENERIC_SELECTION_TYPE_ID => ("Selection", Int32, []),
        Color = GENERIC_COLOR_TYPE_ID => ("Color", Float, ["R", "G", "B"]),
        Transparency = GENERIC_TRANSPARENCY_TYPE_ID => ("Transparency", Float, []),
        Length = FIRST_SPECIFIC_TYPE_ID => ("Length", Float, []),
        Topology = FIRST_SPECIFIC_TYPE_ID + 1 => ("Topology", Int64, ["A", "B"]),
        PeriodicImage = FIRST_SPECIFIC_TYPE_ID + 2 => ("Periodic Image", Int32, ["X", "Y", "Z"]),
    }
}

/// Container kind for per-particle properties
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Particles;

impl ContainerKind for Particles {
    type Standard = ParticleProperty;
    const DISPLAY_NAME: &'static str = "Particles";
    const ELEMENT_DESCRIPTION: &'static str = "particles";
}

/// Container kind for per-bond properties
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Bonds;

impl ContainerKind for Bonds {
    type Standard = BondProperty;
    const DISPLAY_NAME: &'static str = "Bonds";
    const ELEMENT_DESCRIPTION: &'static str = "bonds";
}
