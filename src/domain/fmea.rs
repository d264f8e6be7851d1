// Static FMEA risk table for the flexo line
use super::component::ComponentName;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_rpn(rpn: u32) -> Self {
        if rpn > 250 {
            RiskLevel::High
        } else if rpn > 150 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureMode {
    pub mode: &'static str,
    pub cause: &'static str,
    pub effect: &'static str,
    pub severity: u8,
    pub occurrence: u8,
    pub detection: u8,
}

impl FailureMode {
    /// Risk Priority Number: severity x occurrence x detection.
    pub fn rpn(&self) -> u32 {
        u32::from(self.severity) * u32::from(self.occurrence) * u32::from(self.detection)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureModeView {
    #[serde(flatten)]
    pub failure: FailureMode,
    pub rpn: u32,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentFmea {
    pub component: ComponentName,
    /// Published overall RPN for the component, from historical analysis.
    pub rpn: u32,
    pub risk: RiskLevel,
    pub failures: Vec<FailureModeView>,
}

const fn failure(
    mode: &'static str,
    cause: &'static str,
    effect: &'static str,
    severity: u8,
    occurrence: u8,
    detection: u8,
) -> FailureMode {
    FailureMode {
        mode,
        cause,
        effect,
        severity,
        occurrence,
        detection,
    }
}

fn table(component: ComponentName) -> (u32, [FailureMode; 2]) {
    match component {
        ComponentName::PreFeeder => (
            280,
            [
                failure("Paper Jam", "Roller kotor/aus", "Produksi terhenti", 8, 7, 5),
                failure("Feeding Error", "Sensor misalignment", "Kualitas print buruk", 7, 6, 6),
            ],
        ),
        ComponentName::Feeder => (
            252,
            [
                failure("Double Feed", "Tekanan suction lemah", "Material waste", 7, 6, 6),
                failure("Skewed Feed", "Guide tidak sejajar", "Registrasi tidak akurat", 8, 5, 7),
            ],
        ),
        ComponentName::Printing => (
            320,
            [
                failure("Ink Smudging", "Anilox roller aus", "Kualitas print rendah", 9, 6, 6),
                failure("Registration Error", "Sensor tidak kalibrasi", "Print tidak tepat", 8, 7, 6),
            ],
        ),
        ComponentName::Slotter => (
            210,
            [
                failure("Blade Tumpul", "Wear and tear normal", "Slot tidak rapi", 7, 6, 5),
                failure("Misalignment", "Getaran berlebih", "Dimensi tidak akurat", 8, 5, 6),
            ],
        ),
        ComponentName::Stacker => (
            180,
            [
                failure("Stack Collapse", "Kecepatan terlalu tinggi", "Produk rusak", 6, 5, 6),
                failure("Counting Error", "Sensor kotor", "Salah hitung output", 5, 6, 6),
            ],
        ),
    }
}

pub fn fmea_for(component: ComponentName) -> ComponentFmea {
    let (rpn, failures) = table(component);
    ComponentFmea {
        component,
        rpn,
        risk: RiskLevel::from_rpn(rpn),
        failures: failures
            .into_iter()
            .map(|failure| FailureModeView {
                rpn: failure.rpn(),
                risk: RiskLevel::from_rpn(failure.rpn()),
                failure,
            })
            .collect(),
    }
}
