// src/services/document_service.rs

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        company::Company,
        order::{CustomerInfo, Gst},
    },
};

// ---
// Invoice parameters
// ---

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Everything printed on an invoice. Built by the order workflow, consumed by a renderer.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub company: Company,
    pub customer: CustomerInfo,
    pub products: Vec<InvoiceLine>,
    pub gift_boxes: Vec<InvoiceLine>,
    pub discount_pct: Decimal,
    pub total: Decimal,
    pub discount_amount: Decimal,
    pub gst: Gst,
    pub grand_total: Decimal,
}

impl InvoiceDocument {
    pub fn invoice_number(&self) -> String {
        let id = self.order_id.simple().to_string().to_uppercase();
        format!("INV-{}", &id[..8])
    }

    /// Label/value pairs of the totals block, in print order.
    pub fn totals_rows(&self) -> Vec<(&'static str, String)> {
        let discount = format!("- {} ({}%)", money(self.discount_amount), self.discount_pct.normalize());
        if self.gst.status {
            vec![
                ("Total (Before GST)", money(self.total)),
                ("Discount", discount),
                ("GST", format!("{} ({}%)", money(self.gst.amount), self.gst.percentage.normalize())),
                ("Grand Total", money(self.grand_total)),
            ]
        } else {
            vec![
                ("Total", money(self.total)),
                ("Discount", discount),
                ("Grand Total", money(self.grand_total)),
            ]
        }
    }

    /// `upi://` payment link for the QR code, when the company has a UPI id.
    pub fn upi_payment_uri(&self) -> Option<String> {
        let upi_id = self.company.upi_id.as_deref()?.trim();
        if upi_id.is_empty() {
            return None;
        }
        let amount = format!("{:.2}", self.grand_total);
        let note = self.invoice_number();
        let uri = Url::parse_with_params(
            "upi://pay",
            &[
                ("pa", upi_id),
                ("pn", self.company.name.as_str()),
                ("am", amount.as_str()),
                ("cu", "INR"),
                ("tn", note.as_str()),
            ],
        )
        .ok()?;
        Some(uri.into())
    }
}

fn money(value: Decimal) -> String {
    format!("Rs. {:.2}", value)
}

// ---
// Renderer
// ---

/// Produces an invoice file for a document and returns its local path.
#[async_trait]
pub trait InvoiceRenderer: Send + Sync {
    async fn render(&self, document: &InvoiceDocument) -> Result<PathBuf, AppError>;
}

/// Calls the renderer, retrying once after `delay`.
pub async fn render_with_retry(
    renderer: &dyn InvoiceRenderer,
    document: &InvoiceDocument,
    delay: Duration,
) -> Result<PathBuf, AppError> {
    match renderer.render(document).await {
        Ok(path) => Ok(path),
        Err(err) => {
            tracing::warn!(order_id = %document.order_id, error = %err, "Invoice rendering failed, retrying");
            tokio::time::sleep(delay).await;
            renderer.render(document).await
        }
    }
}

pub struct GenPdfInvoiceRenderer {
    fonts_dir: PathBuf,
    font_family: String,
    tmp_dir: PathBuf,
    timeout: Duration,
}

impl GenPdfInvoiceRenderer {
    pub fn new(fonts_dir: PathBuf, font_family: String, tmp_dir: PathBuf, timeout: Duration) -> Self {
        Self { fonts_dir, font_family, tmp_dir, timeout }
    }
}

#[async_trait]
impl InvoiceRenderer for GenPdfInvoiceRenderer {
    async fn render(&self, document: &InvoiceDocument) -> Result<PathBuf, AppError> {
        let document = document.clone();
        let fonts_dir = self.fonts_dir.clone();
        let font_family = self.font_family.clone();
        let target = self
            .tmp_dir
            .join(format!("{}_{}.pdf", document.invoice_number(), Uuid::new_v4().simple()));

        let task = tokio::task::spawn_blocking(move || {
            write_pdf(&document, &fonts_dir, &font_family, &target).map(|_| target)
        });
        await_render(task, self.timeout).await
    }
}

/// Waits up to `timeout` for a blocking render. A render that finishes after the
/// deadline has its file removed, since nobody will pick it up.
async fn await_render(
    mut task: JoinHandle<Result<PathBuf, AppError>>,
    timeout: Duration,
) -> Result<PathBuf, AppError> {
    match tokio::time::timeout(timeout, &mut task).await {
        Ok(joined) => joined.map_err(|e| anyhow::anyhow!("invoice render task failed: {e}"))?,
        Err(_) => {
            tokio::spawn(async move {
                if let Ok(Ok(late)) = task.await {
                    if let Err(err) = tokio::fs::remove_file(&late).await {
                        tracing::warn!(path = %late.display(), error = %err, "Late invoice render not removed");
                    }
                }
            });
            Err(anyhow::anyhow!("invoice rendering timed out after {timeout:?}").into())
        }
    }
}

fn pdf_err(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("pdf: {e}"))
}

fn write_pdf(doc: &InvoiceDocument, fonts_dir: &Path, font_family: &str, target: &Path) -> Result<(), AppError> {
    let fonts = genpdf::fonts::from_files(fonts_dir, font_family, None)
        .map_err(|e| anyhow::anyhow!("font '{font_family}' not found in {}: {e}", fonts_dir.display()))?;

    let mut pdf = genpdf::Document::new(fonts);
    pdf.set_title(doc.invoice_number());
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    pdf.set_page_decorator(decorator);

    let bold = style::Style::new().bold();
    let company = &doc.company;

    // --- Header ---
    pdf.push(elements::Paragraph::new(company.name.clone()).styled(bold.with_font_size(18)));
    if let Some(tagline) = &company.tagline {
        pdf.push(elements::Paragraph::new(tagline.clone()).styled(style::Style::new().italic()));
    }
    for line in [&company.address, &company.phone, &company.email].into_iter().flatten() {
        pdf.push(elements::Paragraph::new(line.clone()).styled(style::Style::new().with_font_size(9)));
    }
    if doc.gst.status {
        if let Some(gstin) = &company.gst_number {
            pdf.push(elements::Paragraph::new(format!("GSTIN: {gstin}")).styled(bold.with_font_size(9)));
        }
    }
    pdf.push(elements::Break::new(1.5));

    pdf.push(
        elements::Paragraph::new(format!("INVOICE {}", doc.invoice_number())).styled(bold.with_font_size(14)),
    );
    pdf.push(elements::Paragraph::new(format!("Date: {}", doc.created_at.format("%d/%m/%Y %H:%M"))));
    pdf.push(elements::Break::new(1));

    // --- Customer ---
    pdf.push(elements::Paragraph::new("Bill to").styled(bold));
    pdf.push(elements::Paragraph::new(doc.customer.name.clone()));
    for line in [&doc.customer.phone, &doc.customer.address].into_iter().flatten() {
        pdf.push(elements::Paragraph::new(line.clone()));
    }
    pdf.push(elements::Break::new(1.5));

    // --- Lines ---
    if !doc.products.is_empty() {
        pdf.push(elements::Paragraph::new("Products").styled(bold.with_font_size(12)));
        pdf.push(lines_table(&doc.products)?);
        pdf.push(elements::Break::new(1));
    }
    if !doc.gift_boxes.is_empty() {
        pdf.push(elements::Paragraph::new("Gift Boxes").styled(bold.with_font_size(12)));
        pdf.push(lines_table(&doc.gift_boxes)?);
        pdf.push(elements::Break::new(1));
    }

    // --- Totals ---
    let mut totals = elements::TableLayout::new(vec![3, 2]);
    for (label, value) in doc.totals_rows() {
        let row_style = if label == "Grand Total" { bold } else { style::Style::new() };
        let mut value = elements::Paragraph::new(value);
        value.set_alignment(genpdf::Alignment::Right);
        totals
            .row()
            .element(elements::Paragraph::new(label).styled(row_style))
            .element(value.styled(row_style))
            .push()
            .map_err(pdf_err)?;
    }
    pdf.push(totals);

    if !doc.gst.status {
        pdf.push(elements::Break::new(1));
        let mut banner = elements::Paragraph::new("Estimated Total");
        banner.set_alignment(genpdf::Alignment::Center);
        pdf.push(banner.styled(bold.with_font_size(12)));
    }

    // --- Payment ---
    if has_bank_details(company) {
        pdf.push(elements::Break::new(1.5));
        pdf.push(elements::Paragraph::new("Bank details").styled(bold));
        let rows = [
            ("Bank", &company.bank_name),
            ("Account holder", &company.account_holder),
            ("Account number", &company.account_number),
            ("IFSC", &company.ifsc_code),
            ("Branch", &company.branch),
        ];
        for (label, value) in rows {
            if let Some(value) = value {
                pdf.push(elements::Paragraph::new(format!("{label}: {value}")).styled(style::Style::new().with_font_size(9)));
            }
        }
    }

    if let Some(uri) = doc.upi_payment_uri() {
        pdf.push(elements::Break::new(1));
        pdf.push(elements::Paragraph::new("Scan to pay (UPI)").styled(bold));
        let code = QrCode::new(uri.as_bytes()).map_err(pdf_err)?;
        let image = image::DynamicImage::ImageLuma8(code.render::<Luma<u8>>().build());
        let qr = elements::Image::from_dynamic_image(image)
            .map_err(pdf_err)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        pdf.push(qr);
    }

    pdf.render_to_file(target).map_err(pdf_err)?;
    Ok(())
}

fn has_bank_details(company: &Company) -> bool {
    company.bank_name.is_some() || company.account_number.is_some()
}

/// Serial numbers restart at 1 for every section.
fn lines_table(lines: &[InvoiceLine]) -> Result<elements::TableLayout, AppError> {
    let bold = style::Style::new().bold();
    let mut table = elements::TableLayout::new(vec![1, 5, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    table
        .row()
        .element(elements::Paragraph::new("S.No").styled(bold))
        .element(elements::Paragraph::new("Item").styled(bold))
        .element(elements::Paragraph::new("Qty").styled(bold))
        .element(elements::Paragraph::new("Rate").styled(bold))
        .element(elements::Paragraph::new("Amount").styled(bold))
        .push()
        .map_err(pdf_err)?;

    for (serial, line) in serial_numbers(lines) {
        table
            .row()
            .element(elements::Paragraph::new(serial.to_string()))
            .element(elements::Paragraph::new(line.name.clone()))
            .element(elements::Paragraph::new(line.quantity.to_string()))
            .element(elements::Paragraph::new(format!("{:.2}", line.unit_price)))
            .element(elements::Paragraph::new(format!("{:.2}", line.line_total)))
            .push()
            .map_err(pdf_err)?;
    }
    Ok(table)
}

fn serial_numbers(lines: &[InvoiceLine]) -> impl Iterator<Item = (usize, &InvoiceLine)> {
    lines.iter().enumerate().map(|(i, line)| (i + 1, line))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn sample_company() -> Company {
        Company {
            id: Uuid::new_v4(),
            name: "Sivakasi Crackers".into(),
            tagline: None,
            address: None,
            phone: None,
            email: None,
            bank_name: None,
            account_holder: None,
            account_number: None,
            ifsc_code: None,
            branch: None,
            upi_id: Some("sivakasi@upi".into()),
            gst_number: Some("33ABCDE1234F1Z5".into()),
            admin_id: Uuid::new_v4(),
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_document(gst_on: bool) -> InvoiceDocument {
        InvoiceDocument {
            order_id: Uuid::parse_str("4f1c1f0e-3c71-4e7c-9a53-63c1f8d9a1aa").unwrap(),
            created_at: Utc::now(),
            company: sample_company(),
            customer: CustomerInfo { name: "Asha".into(), phone: None, address: None },
            products: vec![InvoiceLine {
                name: "Sparkler".into(),
                quantity: 2,
                unit_price: Decimal::from(50),
                line_total: Decimal::from(100),
            }],
            gift_boxes: vec![],
            discount_pct: Decimal::from(10),
            total: Decimal::from(100),
            discount_amount: Decimal::from(10),
            gst: Gst {
                status: gst_on,
                percentage: if gst_on { Decimal::from(18) } else { Decimal::ZERO },
                amount: if gst_on { Decimal::from(18) } else { Decimal::ZERO },
            },
            grand_total: if gst_on { Decimal::from(108) } else { Decimal::from(90) },
        }
    }

    #[test]
    fn totals_labels_follow_gst_status() {
        let labels: Vec<_> = sample_document(true).totals_rows().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["Total (Before GST)", "Discount", "GST", "Grand Total"]);

        let labels: Vec<_> = sample_document(false).totals_rows().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["Total", "Discount", "Grand Total"]);
    }

    #[test]
    fn grand_total_prints_with_two_decimals() {
        let rows = sample_document(false).totals_rows();
        assert_eq!(rows.last().unwrap().1, "Rs. 90.00");
    }

    #[test]
    fn invoice_number_derives_from_order_id() {
        assert_eq!(sample_document(false).invoice_number(), "INV-4F1C1F0E");
    }

    #[test]
    fn upi_uri_carries_amount_and_payee() {
        let uri = sample_document(false).upi_payment_uri().unwrap();
        assert!(uri.starts_with("upi://pay?pa=sivakasi%40upi&pn=Sivakasi+Crackers&am=90.00&cu=INR"));

        let mut doc = sample_document(false);
        doc.company.upi_id = None;
        assert!(doc.upi_payment_uri().is_none());
    }

    #[test]
    fn upi_uri_escapes_reserved_characters() {
        let mut doc = sample_document(false);
        doc.company.name = "Sri & Sons #1 = best".into();
        doc.company.upi_id = Some("sri&sons@upi".into());

        let uri = Url::parse(&doc.upi_payment_uri().unwrap()).unwrap();
        let params: Vec<(String, String)> = uri.query_pairs().into_owned().collect();
        assert_eq!(params.len(), 5);
        assert_eq!(params[0], ("pa".into(), "sri&sons@upi".into()));
        assert_eq!(params[1], ("pn".into(), "Sri & Sons #1 = best".into()));
        assert_eq!(params[2], ("am".into(), "90.00".into()));
    }

    #[test]
    fn serials_restart_per_section() {
        let doc = sample_document(false);
        let serials: Vec<_> = serial_numbers(&doc.products).map(|(n, _)| n).collect();
        assert_eq!(serials, [1]);
    }

    struct FlakyRenderer {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InvoiceRenderer for FlakyRenderer {
        async fn render(&self, _document: &InvoiceDocument) -> Result<PathBuf, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(anyhow::anyhow!("renderer unavailable").into());
            }
            Ok(PathBuf::from("/tmp/invoice.pdf"))
        }
    }

    #[tokio::test]
    async fn a_single_failure_is_retried() {
        let renderer = FlakyRenderer { failures_left: AtomicUsize::new(1), calls: AtomicUsize::new(0) };
        let path = render_with_retry(&renderer, &sample_document(false), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/invoice.pdf"));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_second_failure_is_reported() {
        let renderer = FlakyRenderer { failures_left: AtomicUsize::new(2), calls: AtomicUsize::new(0) };
        let result = render_with_retry(&renderer, &sample_document(false), Duration::from_millis(1)).await;
        assert!(result.is_err());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn late_render_output_is_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("late.pdf");
        let written = target.clone();
        let task = tokio::task::spawn_blocking(move || -> Result<PathBuf, AppError> {
            std::thread::sleep(Duration::from_millis(200));
            std::fs::write(&written, b"%PDF-1.4").map_err(|e| anyhow::anyhow!("{e}"))?;
            Ok(written)
        });

        let result = await_render(task, Duration::from_millis(10)).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn missing_fonts_fail_without_panicking() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = GenPdfInvoiceRenderer::new(
            tmp.path().join("no-fonts"),
            "Roboto".into(),
            tmp.path().to_path_buf(),
            Duration::from_secs(5),
        );
        assert!(renderer.render(&sample_document(true)).await.is_err());
    }
}
