//! Common regex patterns for proforma invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Document anchor separating the seller letterhead from the invoice body
    pub static ref ANCHOR: Regex = Regex::new(
        r"(?i)Proforma\s+Invoice|PI\s*No|Code\s*No"
    ).unwrap();

    // Identifiers
    pub static ref CODE_NO: Regex = Regex::new(
        r"(?i)\bCode\s*(?:No|Number|#)?\.?\s*[\t:]?\s*([A-Z0-9]{2,20})"
    ).unwrap();

    pub static ref INVOICE_NO: Regex = Regex::new(
        r"(?i)\b(?:PI|Invoice)\s*(?:No|Number|#)\.?\s*[\t:]?\s*([A-Z0-9\-]{3,30})"
    ).unwrap();

    // Dates
    pub static ref DATE_LABELED: Regex = Regex::new(
        r"(?i)(?:Date|Invoice\s*Date)\s*[\t:]?\s*(\d{1,2}[/\-]\d{1,2}[/\-](?:\d{4}|\d{2}))\b"
    ).unwrap();

    pub static ref BARE_DATE: Regex = Regex::new(
        r"^\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}\b"
    ).unwrap();

    pub static ref TRAILING_DATE_FRAGMENT: Regex = Regex::new(
        r"(?i)\s*Date\s*[:=]?\s*\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}.*$"
    ).unwrap();

    // Customer
    pub static ref CUSTOMER_NAME: Regex = Regex::new(
        r"(?i)\bCustomer\s*Name\b\s*[\t:=]?\s*"
    ).unwrap();

    pub static ref TRAILING_DATE_LABEL: Regex = Regex::new(
        r"(?i)\s+Date\b.*$"
    ).unwrap();

    pub static ref CUSTOMER_NEXT_LINE_STOP: Regex = Regex::new(
        r"(?i)^(?:Tel|Fax|Email|Phone|Address|Date)"
    ).unwrap();

    // Address
    pub static ref ADDRESS_LABEL: Regex = Regex::new(
        r"(?i)\bP\.?\s*O\.?\s*B(?:OX)?\b|\bAddress\b"
    ).unwrap();

    pub static ref ADDRESS_TRAILING_LABEL: Regex = Regex::new(
        r"(?i)\s+(?:Cust|Ref|Date|Del|Kind|Type|Invoice|PI|Code|Customer)\b.*$"
    ).unwrap();

    pub static ref ADDRESS_STOP: Regex = Regex::new(
        r"(?i)^(?:Tel(?:ephone)?|Fax|E-?mail|Phone|Cust(?:omer)?|Ref|Date|Del|Kind|Type|Invoice|PI|Code)\b"
    ).unwrap();

    pub static ref ADDRESS_EMBEDDED_LABEL: Regex = Regex::new(
        r"(?i)(?:Cust|Ref)\s*(?:Ref|Date|:)"
    ).unwrap();

    pub static ref ADDRESS_CLEANUP: Regex = Regex::new(
        r"(?i)\s+(?:Cust\s*Ref|Ref\s*Date|Del\.?\s*Date)[\s:]*[^,]*"
    ).unwrap();

    // Contact
    pub static ref PHONE: Regex = Regex::new(
        r"(?i)\b(?:Tel|Telephone|Phone)\s*[\t:]?\s*([\+\d][\d\s\-/\(\)\.,]{5,})"
    ).unwrap();

    pub static ref PHONE_TAIL: Regex = Regex::new(
        r"[\s\-/\(\)]+(?:\D.*)?$"
    ).unwrap();

    pub static ref SELLER_PHONE: Regex = Regex::new(
        r"(?i)(?:Tel\.?|Telephone|Phone)[:\s]*([\+\d][\d\s\-/\(\),]{4,}\d)"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[\w.\-]+@[\w.\-]+\.\w+"
    ).unwrap();

    // Seller tax identifiers
    pub static ref SELLER_TIN: Regex = Regex::new(
        r"(?i)\b(?:TIN|Tax\s*ID)\s*(?:No\.?)?\s*[:.]?\s*([0-9][0-9\-]{5,})"
    ).unwrap();

    pub static ref SELLER_VRN: Regex = Regex::new(
        r"(?i)\b(?:VRN|VAT\s*Reg(?:istration)?\.?\s*(?:No\.?)?)\s*[:.]?\s*([0-9A-Z][0-9A-Z\-]{5,})"
    ).unwrap();

    // Reference
    pub static ref REFERENCE_FOR_T: Regex = Regex::new(
        r"(?i)\b(FOR\s+T\s+\d+\s+[A-Z]+)"
    ).unwrap();

    pub static ref REFERENCE: Regex = Regex::new(
        r"(?i)(?:^|\s)(?:Reference|Ref\.?)\s*[\t:]?\s*(.+?)(?:\s+Date|$)"
    ).unwrap();

    pub static ref REFERENCE_CUST_REF: Regex = Regex::new(
        r"(?i)^(?:Cust|Ref)\s*Ref"
    ).unwrap();

    pub static ref REFERENCE_CLEANUP: Regex = Regex::new(
        r"(?i)\s*(?:Date|Ref\s*Date).*$"
    ).unwrap();

    // Lines that look like another label when scanning ahead for a value
    pub static ref LABEL_STOPLIST: Regex = Regex::new(
        r"(?i)^(?:Tel|Fax|Email|Address|Reference|PI|Date|Code|Cust|Ref|Del|Page)"
    ).unwrap();

    // Generic labeled fields, most specific first
    pub static ref PAYMENT_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bPayment\s*Method\b").unwrap(),
        Regex::new(r"(?i)\bPayment\s*Terms?\b").unwrap(),
        Regex::new(r"(?i)\bPayment\b").unwrap(),
    ];

    pub static ref DELIVERY_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bDelivery\s*Terms\b").unwrap(),
        Regex::new(r"(?i)\bDelivery\b").unwrap(),
    ];

    pub static ref REMARKS_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bRemarks\b").unwrap(),
        Regex::new(r"(?i)\bNotes\b").unwrap(),
        Regex::new(r"\bNOTE\b").unwrap(),
    ];

    pub static ref ATTENDED_BY_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bAttended\s*By\b").unwrap(),
    ];

    pub static ref KIND_ATTENTION_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)\bKind\s*Attention\b").unwrap(),
    ];

    // Monetary totals: label, optional "@ 18%" segment, separator, currency, amount
    pub static ref SUBTOTAL: Regex = amount_regex(r"Net\s*Value|Sub\s*-?\s*Total|Net\s*Amount");
    pub static ref TAX: Regex = amount_regex(r"VAT|Tax|GST");
    pub static ref TOTAL: Regex = amount_regex(r"Gross\s*Value|Grand\s*Total|Total\s*Amount");

    // Item section
    pub static ref ITEM_START: Regex = Regex::new(
        r"^(\d{1,2})\s+"
    ).unwrap();

    pub static ref ITEM_SECTION_END: Regex = Regex::new(
        r"(?i)(Net\s*Value|Gross\s*Value|Grand\s*Total|Total\s*:|Page\s*\d+|Existing\s*Customer|Sub\s*-?\s*Total|Total\s*Amount)"
    ).unwrap();

    pub static ref CONTINUATION_STOP: Regex = Regex::new(
        r"(?i)Net\s*Value|Gross\s*Value|Grand\s*Total|Total\s*:|Page\s*\d+|Existing\s*Customer|Customer\s*Information|Invoice\s*Date|\bDate\b"
    ).unwrap();

    pub static ref NUMERIC_ONLY_LINE: Regex = Regex::new(
        r"^[\d.%]+$"
    ).unwrap();

    pub static ref LEADING_NUMBER_AMOUNT: Regex = Regex::new(
        r"^\d+\s+[\d,.]+"
    ).unwrap();

    pub static ref LEADING_QTY_UNIT: Regex = Regex::new(
        r"(?i)^\d+\s+(PCS|NOS|UNT|KG|LTR|BOX|CASE)\b"
    ).unwrap();

    pub static ref ITEM_CODE_PREFIX: Regex = Regex::new(
        r"^(\d{6,15}|[A-Z0-9]{3,15})\s+"
    ).unwrap();

    pub static ref NUMBER: Regex = Regex::new(
        r"\d+(?:,\d+)*(?:\.\d+)?"
    ).unwrap();

    pub static ref PERCENT_SUFFIX: Regex = Regex::new(
        r"^\s?%"
    ).unwrap();

    pub static ref TRAILING_NUMERIC: Regex = Regex::new(
        r"(?:\s+[\d,.%]+)+\s*$"
    ).unwrap();

    pub static ref NUMERIC_TAIL: Regex = Regex::new(
        r"^[\s\d,.%]*$"
    ).unwrap();

    // Table body
    pub static ref TABLE_BODY_END: Regex = Regex::new(
        r"(?i)(Net\s*Value|Gross\s*Value|Grand\s*Total|Total\s*:)"
    ).unwrap();

    pub static ref DIGIT_RUN_CODE: Regex = Regex::new(
        r"\d{3,15}"
    ).unwrap();

    pub static ref DIGIT_RUN_QTY: Regex = Regex::new(
        r"\d{1,4}"
    ).unwrap();

    pub static ref NON_DECIMAL_CHARS: Regex = Regex::new(
        r"[^\d.\-]"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Build an amount pattern for the given label alternation.
fn amount_regex(labels: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)\b(?:{labels})\b(?:\s*(?:@\s*)?\(?\d{{1,2}}(?:\.\d+)?\s*%\)?)?\s*[:=]?\s*(?:(?:TSH|TZS|UGX|KES|USD|EUR)\.?\s*)?(\d{{1,3}}(?:,\d{{3}})+(?:\.\d+)?|\d+(?:\.\d+)?)"
    ))
    .unwrap()
}

/// Keyword categories that identify an item table header line.
pub mod header_keywords {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        /// Whole-line categories used by the text fallback.
        pub static ref LINE_CATEGORIES: Vec<Regex> = vec![
            Regex::new(r"(?i)\b(?:Sr|S\.N|Serial|No\.?)\b").unwrap(),
            Regex::new(r"(?i)\b(?:Item|Code|Product)\b").unwrap(),
            Regex::new(r"(?i)\b(?:Description|Desc)\b").unwrap(),
            Regex::new(r"(?i)\b(?:Qty|Quantity)\b").unwrap(),
            Regex::new(r"(?i)\b(?:Rate|Price|Value|Amount)\b").unwrap(),
        ];

        /// Row categories used by the positioned-token table extractor.
        pub static ref ROW_CATEGORIES: Vec<Regex> = vec![
            Regex::new(r"(?i)\bSr\b|\bS\.?\s*No\.?").unwrap(),
            Regex::new(r"(?i)Item\s*Code|\bCode\b").unwrap(),
            Regex::new(r"(?i)Description|\bDesc\b").unwrap(),
            Regex::new(r"(?i)\bQty\b|Quantity").unwrap(),
            Regex::new(r"(?i)\bRate\b|Unit\s*Price|\bPrice\b").unwrap(),
            Regex::new(r"(?i)\bValue\b|\bAmount\b").unwrap(),
        ];

        /// A line made only of column header words.
        pub static ref HEADER_WORDS_ONLY: Regex = Regex::new(
            r"(?i)^(?:(?:Sr|S\.?\s*No|No|Serial|Item|Code|Product|Description|Desc|Type|Unit|Qty|Quantity|Rate|Price|Value|Amount|VAT|%|\.|:)\s*)+$"
        ).unwrap();
    }

    /// Count how many categories match `text`.
    pub fn score(categories: &[Regex], text: &str) -> usize {
        categories.iter().filter(|re| re.is_match(text)).count()
    }
}
