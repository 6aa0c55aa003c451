//! Label templates.
//!
//! Template selection is a closed enum: adding a template forces every
//! `match` below to handle it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintTemplate {
    /// 60x40mm product label with Code 128 barcode.
    Standard,
    /// 40x20mm small-part label.
    Compact,
    /// 100x100mm shipping label with QR code and address block.
    Shipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Code128,
    QrCode,
}

/// Input for one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelData {
    pub barcode: String,
    pub title: Option<String>,
    pub order_no: Option<String>,
    pub quantity: Option<u32>,
    pub recipient: Option<String>,
    pub address: Option<String>,
}

impl LabelData {
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelField {
    pub name: &'static str,
    pub value: String,
}

/// What the renderer draws: dimensions, code symbology and text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelLayout {
    pub template: PrintTemplate,
    pub width_mm: u32,
    pub height_mm: u32,
    pub symbology: Symbology,
    pub code: String,
    pub fields: Vec<LabelField>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrintError {
    #[error("barcode content is empty")]
    EmptyBarcode,

    #[error("barcode '{0}' contains characters Code 128 cannot encode")]
    UnencodableBarcode(String),

    #[error("{template:?} label requires field '{field}'")]
    MissingField {
        template: PrintTemplate,
        field: &'static str,
    },

    #[error("copies must be between 1 and {max}, got {got}")]
    InvalidCopies { got: u32, max: u32 },
}

const COMPACT_TITLE_CHARS: usize = 16;

impl PrintTemplate {
    pub const ALL: [PrintTemplate; 3] = [
        PrintTemplate::Standard,
        PrintTemplate::Compact,
        PrintTemplate::Shipping,
    ];

    /// Label size in millimetres (width, height).
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            PrintTemplate::Standard => (60, 40),
            PrintTemplate::Compact => (40, 20),
            PrintTemplate::Shipping => (100, 100),
        }
    }

    pub fn symbology(self) -> Symbology {
        match self {
            PrintTemplate::Standard | PrintTemplate::Compact => Symbology::Code128,
            PrintTemplate::Shipping => Symbology::QrCode,
        }
    }

    pub fn render(self, data: &LabelData) -> Result<LabelLayout, PrintError> {
        let code = data.barcode.trim();
        if code.is_empty() {
            return Err(PrintError::EmptyBarcode);
        }
        let code128_safe = code.chars().all(|c| c.is_ascii() && !c.is_ascii_control());
        if self.symbology() == Symbology::Code128 && !code128_safe {
            return Err(PrintError::UnencodableBarcode(code.to_string()));
        }

        let fields = match self {
            PrintTemplate::Standard => {
                let mut fields = Vec::new();
                push_opt(&mut fields, "title", data.title.as_deref());
                push_opt(&mut fields, "orderNo", data.order_no.as_deref());
                if let Some(qty) = data.quantity {
                    fields.push(LabelField {
                        name: "quantity",
                        value: qty.to_string(),
                    });
                }
                fields
            }
            PrintTemplate::Compact => {
                let mut fields = Vec::new();
                if let Some(title) = data.title.as_deref() {
                    fields.push(LabelField {
                        name: "title",
                        value: title.chars().take(COMPACT_TITLE_CHARS).collect(),
                    });
                }
                fields
            }
            PrintTemplate::Shipping => {
                let recipient = require(self, "recipient", data.recipient.as_deref())?;
                let address = require(self, "address", data.address.as_deref())?;
                let mut fields = vec![
                    LabelField {
                        name: "recipient",
                        value: recipient.to_string(),
                    },
                    LabelField {
                        name: "address",
                        value: address.to_string(),
                    },
                ];
                push_opt(&mut fields, "orderNo", data.order_no.as_deref());
                fields
            }
        };

        let (width_mm, height_mm) = self.dimensions();
        Ok(LabelLayout {
            template: self,
            width_mm,
            height_mm,
            symbology: self.symbology(),
            code: code.to_string(),
            fields,
        })
    }
}

fn push_opt(fields: &mut Vec<LabelField>, name: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        fields.push(LabelField {
            name,
            value: value.to_string(),
        });
    }
}

fn require<'a>(
    template: PrintTemplate,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, PrintError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(PrintError::MissingField { template, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_label_carries_optional_fields() {
        let data = LabelData {
            title: Some("Widget".to_string()),
            quantity: Some(12),
            ..LabelData::new(" 6901234567892 ")
        };
        let layout = PrintTemplate::Standard.render(&data).unwrap();

        assert_eq!((layout.width_mm, layout.height_mm), (60, 40));
        assert_eq!(layout.symbology, Symbology::Code128);
        assert_eq!(layout.code, "6901234567892");
        let names: Vec<&str> = layout.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["title", "quantity"]);
    }

    #[test]
    fn compact_truncates_title() {
        let data = LabelData {
            title: Some("A very long product description".to_string()),
            ..LabelData::new("X1")
        };
        let layout = PrintTemplate::Compact.render(&data).unwrap();
        assert_eq!(layout.fields[0].value.chars().count(), COMPACT_TITLE_CHARS);
    }

    #[test]
    fn shipping_requires_address_block() {
        let err = PrintTemplate::Shipping
            .render(&LabelData::new("SO-1"))
            .unwrap_err();
        assert_eq!(
            err,
            PrintError::MissingField {
                template: PrintTemplate::Shipping,
                field: "recipient"
            }
        );

        let data = LabelData {
            recipient: Some("Ada".to_string()),
            address: Some("1 Main St".to_string()),
            ..LabelData::new("SO-1")
        };
        let layout = PrintTemplate::Shipping.render(&data).unwrap();
        assert_eq!(layout.symbology, Symbology::QrCode);
    }

    #[test]
    fn empty_and_unencodable_barcodes_are_rejected() {
        for template in PrintTemplate::ALL {
            assert_eq!(
                template.render(&LabelData::new("   ")).unwrap_err(),
                PrintError::EmptyBarcode
            );
        }
        assert!(matches!(
            PrintTemplate::Standard.render(&LabelData::new("条码")),
            Err(PrintError::UnencodableBarcode(_))
        ));
    }
}
