// storefront/src/services/templates.rs

//! HTML rendering for order emails and packing slips. Every value that came
//! from a buyer or the payment provider is escaped.

use std::fmt::Write;

use crate::models::{format_gbp, Order, ShippingAddress};

const DEFAULT_FONT: &str = "Default";

pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for c in input.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

fn address_block(address: Option<&ShippingAddress>, line_tag: (&str, &str)) -> Option<String> {
  let address = address?;
  let lines = address.lines();
  if lines.is_empty() {
    return None;
  }
  let mut html = String::new();
  for line in lines {
    let _ = write!(html, "{}{}{}", line_tag.0, escape_html(line), line_tag.1);
  }
  if let Some(phone) = address.phone.as_deref().filter(|p| !p.is_empty()) {
    let _ = write!(html, "<div>Phone: {}</div>", escape_html(phone));
  }
  Some(html)
}

pub fn render_order_email(order: &Order) -> String {
  let mut html = String::new();
  html.push_str(r#"<div style="font-family: Arial, sans-serif; background:#f6f7fb; padding:24px">"#);
  html.push_str(r#"<div style="max-width:700px;margin:auto;background:#ffffff;border-radius:12px;padding:24px">"#);
  html.push_str(r#"<h1 style="margin-top:0">Thank you for your order &#128153;</h1>"#);
  let _ = write!(
    html,
    "<p>Your order <strong>{}</strong> has been received.</p>",
    escape_html(&order.id)
  );

  if let Some(address) = address_block(order.shipping_address.as_ref(), ("", "<br/>")) {
    let _ = write!(
      html,
      r#"<div style="margin-top:10px"><strong>Shipping address</strong><br/>{}</div>"#,
      address
    );
  }

  html.push_str("<hr />");
  for item in &order.items {
    html.push_str(r#"<div style="display:flex;gap:16px;margin-bottom:16px">"#);
    if let Some(url) = item.upload_url.as_deref().filter(|u| !u.is_empty()) {
      let _ = write!(
        html,
        r#"<img src="{}" style="width:120px;height:90px;object-fit:contain;border:1px solid #ddd;border-radius:8px" />"#,
        escape_html(url)
      );
    }
    let _ = write!(
      html,
      "<div><strong>{}</strong><br/>Qty: {}<br/>Unit price: {}<br/>Line total: {}",
      escape_html(&item.name),
      item.quantity,
      format_gbp(item.unit_price_pence),
      format_gbp(item.line_total_pence)
    );
    if let Some(text) = item.custom_text.as_deref().filter(|t| !t.is_empty()) {
      let _ = write!(
        html,
        r#"<div style="margin-top:6px">Text: &quot;{}&quot;<br/>Font: {}</div>"#,
        escape_html(text),
        escape_html(item.font.as_deref().unwrap_or(DEFAULT_FONT))
      );
    }
    html.push_str("</div></div>");
  }

  html.push_str("<hr />");
  let _ = write!(
    html,
    "<p>Subtotal: {}</p><p>Shipping: {}</p><h2>Total: {}</h2>",
    format_gbp(order.subtotal_pence),
    format_gbp(order.shipping_pence),
    format_gbp(order.total_pence)
  );

  if let Some(tracking) = order.tracking_number.as_deref().filter(|t| !t.is_empty()) {
    let _ = write!(
      html,
      "<hr /><h3>Tracking</h3><p>Your tracking number is: <strong>{}</strong></p>",
      escape_html(tracking)
    );
  }

  html.push_str("<hr />");
  html.push_str(r#"<p style="font-size:14px;color:#555">We'll begin working on your item shortly. If you have any questions, reply to this email.</p>"#);
  html.push_str(r#"<p style="margin-top:24px;font-weight:bold">Generations in Making</p>"#);
  html.push_str("</div></div>");
  html
}

/// Printable page for the parcel: ship-to block, items with personalisation, totals.
pub fn render_packing_slip(order: &Order) -> String {
  let cell = "padding:10px 0;border-bottom:1px solid #eee";
  let mut html = String::new();
  let _ = write!(
    html,
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Packing slip {}</title>",
    escape_html(&order.id)
  );
  html.push_str("<style>@media print { button, a { display: none !important; } body { background: white !important; } }</style>");
  html.push_str(r#"</head><body><div style="padding:24px;max-width:800px;margin:0 auto;font-family:Arial, sans-serif">"#);
  html.push_str(r#"<div style="display:flex;justify-content:space-between;margin-bottom:16px"><a href="/admin/orders">&larr; Back</a><button onclick="window.print()">Print</button></div>"#);
  html.push_str(r#"<h1 style="margin:0">Packing Slip</h1>"#);
  let _ = write!(
    html,
    r#"<div style="margin-top:6px;color:#333"><strong>Order:</strong> {} &bull; <strong>Date:</strong> {}</div>"#,
    escape_html(&order.id),
    order.created_at.format("%d %b %Y %H:%M UTC")
  );

  html.push_str(r#"<hr style="margin:16px 0" /><h2 style="margin:0 0 8px 0">Ship to</h2>"#);
  match address_block(order.shipping_address.as_ref(), ("<div>", "</div>")) {
    Some(address) => {
      let _ = write!(html, r#"<div style="line-height:1.5">{}</div>"#, address);
    }
    None => html.push_str("<div>Shipping address not available.</div>"),
  }

  html.push_str(r#"<hr style="margin:16px 0" /><h2 style="margin:0 0 8px 0">Items</h2>"#);
  html.push_str(r#"<table style="width:100%;border-collapse:collapse"><thead><tr><th style="text-align:left">Item</th><th style="text-align:right">Qty</th><th style="text-align:right">Line</th></tr></thead><tbody>"#);
  for item in &order.items {
    let _ = write!(
      html,
      r#"<tr><td style="{}"><div style="font-weight:700">{}</div>"#,
      cell,
      escape_html(&item.name)
    );
    if let Some(text) = item.custom_text.as_deref().filter(|t| !t.is_empty()) {
      let _ = write!(
        html,
        r#"<div style="color:#444;margin-top:4px">Text: &ldquo;{}&rdquo; &bull; Font: {}</div>"#,
        escape_html(text),
        escape_html(item.font.as_deref().unwrap_or(DEFAULT_FONT))
      );
    }
    if let Some(url) = item.upload_url.as_deref().filter(|u| !u.is_empty()) {
      let _ = write!(html, r#"<div style="color:#444;margin-top:4px">Upload: {}</div>"#, escape_html(url));
    }
    let _ = write!(
      html,
      r#"</td><td style="text-align:right;{cell}">{}</td><td style="text-align:right;{cell}">{}</td></tr>"#,
      item.quantity,
      format_gbp(item.line_total_pence),
      cell = cell
    );
  }
  html.push_str("</tbody></table>");

  let _ = write!(
    html,
    r#"<div style="margin-top:16px;text-align:right"><div>Subtotal: {}</div><div>Shipping: {}</div><div style="font-size:18px;font-weight:900;margin-top:6px">Total: {}</div></div>"#,
    format_gbp(order.subtotal_pence),
    format_gbp(order.shipping_pence),
    format_gbp(order.total_pence)
  );
  if let Some(tracking) = order.tracking_number.as_deref().filter(|t| !t.is_empty()) {
    let _ = write!(
      html,
      r#"<div style="margin-top:16px"><strong>Tracking:</strong> {}</div>"#,
      escape_html(tracking)
    );
  }
  html.push_str("</div></body></html>");
  html
}
