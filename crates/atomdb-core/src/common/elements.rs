//! Periodic table symbols and symbol/atomic-number lookup.

pub const MAX_ATOMIC_NUMBER: u32 = 118;

#[rustfmt::skip]
const ELEMENT_SYMBOLS: [&str; MAX_ATOMIC_NUMBER as usize] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg",
    "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr",
    "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf",
    "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po",
    "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs",
    "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

pub fn element_symbol(atomic_number: u32) -> Option<&'static str> {
    if atomic_number == 0 || atomic_number > MAX_ATOMIC_NUMBER {
        return None;
    }
    Some(ELEMENT_SYMBOLS[(atomic_number - 1) as usize])
}

pub fn atomic_number_for_symbol(symbol: &str) -> Option<u32> {
    let normalized = symbol.trim();
    if normalized.is_empty() {
        return None;
    }

    ELEMENT_SYMBOLS
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(normalized))
        .map(|index| index as u32 + 1)
}

/// Canonical capitalization of an element symbol (`"cl"` -> `"Cl"`).
///
/// Unknown symbols are normalized the same way so that lookup failures
/// report what the caller meant.
pub fn normalize_symbol(symbol: &str) -> String {
    if let Some(canonical) = atomic_number_for_symbol(symbol).and_then(element_symbol) {
        return canonical.to_string();
    }

    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
