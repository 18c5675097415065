use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponClass {
    Pistol,
    Rifle,
    SniperRifle,
    Smg,
    Shotgun,
    MachineGun,
    Melee,
    Equipment,
    Grenade,
    Bomb,
}

impl WeaponClass {
    pub fn of(weapon: &str) -> Option<WeaponClass> {
        Some(match weapon {
            "Glock-18" | "P2000" | "USP-S" | "P250" | "Desert Eagle" | "Five-SeveN" | "Tec-9"
            | "CZ75-Auto" | "Dual Berettas" | "R8 Revolver" => WeaponClass::Pistol,
            "AK-47" | "M4A4" | "M4A1-S" | "M4A1" | "FAMAS" | "Galil AR" | "SG 553" | "AUG" => {
                WeaponClass::Rifle
            }
            "AWP" | "SSG 08" | "SCAR-20" | "G3SG1" => WeaponClass::SniperRifle,
            "MP9" | "MP7" | "UMP-45" | "P90" | "PP-Bizon" | "MAC-10" | "MP5-SD" => WeaponClass::Smg,
            "MAG-7" | "XM1014" | "Nova" | "Sawed-Off" => WeaponClass::Shotgun,
            "Negev" | "M249" => WeaponClass::MachineGun,
            "Knife" => WeaponClass::Melee,
            "Zeus x27" => WeaponClass::Equipment,
            "HE Grenade" | "Flashbang" | "Smoke Grenade" | "Molotov" | "Incendiary Grenade"
            | "Decoy Grenade" => WeaponClass::Grenade,
            "C4 Explosive" => WeaponClass::Bomb,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            WeaponClass::Pistol => "Pistol",
            WeaponClass::Rifle => "Rifle",
            WeaponClass::SniperRifle => "Sniper Rifle",
            WeaponClass::Smg => "SMG",
            WeaponClass::Shotgun => "Shotgun",
            WeaponClass::MachineGun => "Machine Gun",
            WeaponClass::Melee => "Melee",
            WeaponClass::Equipment => "Equipment",
            WeaponClass::Grenade => "Grenade",
            WeaponClass::Bomb => "Bomb",
        }
    }
}

impl fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class label used as the role of a kill; unknown weapons keep their name visible.
pub fn class_label(weapon: &str) -> String {
    match WeaponClass::of(weapon) {
        Some(class) => class.to_string(),
        None => format!("Unknown Weapon Type [{}]", weapon),
    }
}

#[cfg(test)]
mod tests {
    use super::{class_label, WeaponClass};

    #[test]
    fn test_classify() {
        assert_eq!(WeaponClass::of("AK-47"), Some(WeaponClass::Rifle));
        assert_eq!(WeaponClass::of("AWP"), Some(WeaponClass::SniperRifle));
        assert_eq!(WeaponClass::of("Molotov"), Some(WeaponClass::Grenade));
        assert_eq!(WeaponClass::of("ak-47"), None);

        assert_eq!(class_label("MP9"), "SMG");
        assert_eq!(class_label("Zeus x27"), "Equipment");
        assert_eq!(class_label("World"), "Unknown Weapon Type [World]");
    }
}
