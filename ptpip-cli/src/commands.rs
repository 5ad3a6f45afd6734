//! Named commands dispatched against a dialled client.
//!
//! Every command resolves to a single response string; errors come
//! back as one line prefixed with the command name.

use std::collections::HashMap;

use image::RgbaImage;
use ptpip_core::client::Client;
use ptpip_core::fmt;
use ptpip_core::ptp::property::Form;
use ptpip_core::ptp::schema;
use ptpip_core::{DevicePropCode, OperationCode};
use ptpip_viewfinder::fuji_xt1_viewfinder;

/// Dispatch one command line.
pub async fn dispatch(client: &mut Client, line: &str) -> String {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return String::new();
    };
    let args: Vec<&str> = words.collect();

    match name {
        "capture" | "shoot" | "shutter" | "snap" => capture(client, &args).await,
        "info" => info(client).await,
        "get" | "getval" => get(client, &args).await,
        "set" => set(client, &args).await,
        "describe" => describe(client, &args).await,
        "opreq" => opreq(client, &args).await,
        "state" => state(client, &args).await,
        _ => "unknown command\n".to_string(),
    }
}

async fn capture(client: &mut Client, args: &[&str]) -> String {
    let preview = match client.initiate_capture().await {
        Ok(bytes) => bytes,
        Err(e) => return format!("capture: {e}\n"),
    };
    if let Some(path) = args.first() {
        return match tokio::fs::write(path, &preview).await {
            Ok(()) => format!("Image preview saved to {path}\n"),
            Err(e) => format!("capture: {e}\n"),
        };
    }
    "Image captured, check the camera\n".to_string()
}

async fn info(client: &mut Client) -> String {
    match client.get_device_info().await {
        Ok(info) => format!("{info}\n"),
        Err(e) => format!("info: {e}\n"),
    }
}

async fn get(client: &mut Client, args: &[&str]) -> String {
    let Some(arg) = args.first() else {
        return "get: missing property\n".to_string();
    };
    let code = match schema::resolve(arg) {
        Ok(code) => code,
        Err(_) => return format!("get: unknown property '{arg}'\n"),
    };
    match client.get_device_property_value(code).await {
        Ok(value) => format!(
            "{} ({value:#x})\n",
            fmt::device_prop_value_as_string(client.vendor(), code, value as i64)
        ),
        Err(e) => format!("get: {e}\n"),
    }
}

async fn set(client: &mut Client, args: &[&str]) -> String {
    let (Some(arg), Some(raw)) = (args.first(), args.get(1)) else {
        return "set: usage: set <prop> <hexval>\n".to_string();
    };
    let code = match schema::resolve(arg) {
        Ok(code) => code,
        Err(_) => return format!("set: unknown property '{arg}'\n"),
    };
    let value = match parse_hex(raw) {
        Some(v) => v,
        None => return format!("set: invalid hex value '{raw}'\n"),
    };
    match client.set_device_property(code, value).await {
        Ok(()) => format!("{} set to {value:#x}\n", code),
        Err(e) => format!("set: {e}\n"),
    }
}

async fn describe(client: &mut Client, args: &[&str]) -> String {
    let Some(arg) = args.first() else {
        return "describe: missing property\n".to_string();
    };
    let code = match schema::resolve(arg) {
        Ok(code) => code,
        Err(_) => return format!("describe: unknown property '{arg}'\n"),
    };
    match client.get_device_property_desc(code).await {
        Ok(desc) => {
            let mut out = format!(
                "property {} type {} access {:?}\n  factory default: {}\n  current: {}\n",
                desc.code, desc.data_type, desc.access, desc.factory_default, desc.current
            );
            match &desc.form {
                Form::None => {}
                Form::Range { min, max, step } => {
                    out.push_str(&format!("  range: {min}..{max} step {step}\n"));
                }
                Form::Enum(values) => {
                    let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    out.push_str(&format!("  enum: {}\n", list.join(", ")));
                }
            }
            out
        }
        Err(e) => format!("describe: {e}\n"),
    }
}

async fn opreq(client: &mut Client, args: &[&str]) -> String {
    let Some(raw) = args.first() else {
        return "opreq: missing opcode\n".to_string();
    };
    let Some(opcode) = parse_hex(raw) else {
        return format!("opreq: invalid hex opcode '{raw}'\n");
    };
    let mut params = Vec::with_capacity(args.len() - 1);
    for raw in &args[1..] {
        match parse_hex(raw) {
            Some(p) => params.push(p),
            None => return format!("opreq: invalid hex parameter '{raw}'\n"),
        }
    }

    match client
        .operation_request_raw(OperationCode(opcode as u16), &params)
        .await
    {
        Ok(packets) => {
            let mut out = String::new();
            for raw in &packets {
                out.push_str(&format!(
                    "\nReceived {} bytes. HEX dump:\n{}",
                    raw.len(),
                    hex_dump(raw)
                ));
            }
            out
        }
        Err(e) => format!("opreq: {e}\n"),
    }
}

async fn state(client: &mut Client, args: &[&str]) -> String {
    let descs = match client.get_device_state().await {
        Ok(descs) => descs,
        Err(e) => return format!("state: {e}\n"),
    };

    let mut out = String::new();
    for desc in &descs {
        let value = desc.current.as_i64().unwrap_or_default();
        out.push_str(&format!(
            "{}: {}\n",
            desc.code,
            fmt::device_prop_value_as_string(client.vendor(), desc.code, value)
        ));
    }

    if let Some(path) = args.first() {
        match render_overlay(client, path) {
            Ok(()) => out.push_str(&format!("Viewfinder overlay saved to {path}\n")),
            Err(e) => out.push_str(&format!("state: {e}\n")),
        }
    }
    out
}

/// Render the cached property values through the X-T1 widget set.
fn render_overlay(client: &Client, path: &str) -> Result<(), image::ImageError> {
    let mut img = RgbaImage::from_pixel(640, 480, image::Rgba([0, 0, 0, 255]));
    let mut viewfinder = fuji_xt1_viewfinder(&img);

    let values: HashMap<DevicePropCode, i64> = client
        .cached_properties()
        .iter()
        .map(|(code, cached)| (*code, cached.value as i64))
        .collect();
    viewfinder.draw_all(&mut img, &values);
    img.save(path)
}

/// Parse `0x`-optional hexadecimal into a `u32`.
fn parse_hex(s: &str) -> Option<u32> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u32::from_str_radix(digits, 16).ok()
}

/// Sixteen bytes per row: offset, hex columns, ASCII gutter.
fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if (0x20..0x7F).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        out.push_str(&format!("{:08x}  {:<47}  |{}|\n", i * 16, hex.join(" "), ascii));
    }
    out
}
