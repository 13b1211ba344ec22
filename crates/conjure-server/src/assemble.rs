//! Context assembly.
//!
//! Turns one raw request into a fully populated [`Context`] before any
//! middleware runs. Every transport view is parsed best-effort: a body that
//! is not valid UTF-8, a mangled query string or an oversized multipart
//! payload leaves the corresponding view empty rather than failing the
//! request. Handlers observe missing data through the typed accessors.

use bytes::Bytes;
use conjure_core::{Context, FileMap, UploadedFile, Values, ValuesList};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};

/// Builds the per-request context from the decomposed request.
///
/// `params` comes from route resolution; everything else from the wire.
pub(crate) async fn build_context(
    method: Method,
    path: String,
    raw_query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
    params: Values,
    max_upload_bytes: usize,
) -> Context {
    let mut ctx = Context::new(method, path);
    ctx.set_params(params);
    ctx.set_headers(header_values(headers));

    if let Some(raw) = raw_query {
        ctx.set_query(urlencoded_values(raw));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let mime = content_type
        .as_deref()
        .and_then(|ct| ct.parse::<mime::Mime>().ok());

    match mime {
        Some(m) if m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.as_ref() => {
            ctx.set_form(urlencoded_values(&String::from_utf8_lossy(&body)));
        }
        Some(m) if m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA => {
            if body.len() > max_upload_bytes {
                tracing::warn!(
                    size = body.len(),
                    limit = max_upload_bytes,
                    "multipart body over the upload limit, skipping parse"
                );
            } else if let Some(ct) = content_type.as_deref() {
                match parse_multipart(body.clone(), ct).await {
                    Ok((fields, files)) => {
                        ctx.set_multipart(fields);
                        ctx.set_files(files);
                    }
                    Err(e) => tracing::debug!(error = %e, "multipart parse failed"),
                }
            }
        }
        _ => {}
    }

    ctx.set_body(String::from_utf8_lossy(&body).into_owned());
    ctx
}

/// Copies headers into the multi-valued view. Names arrive lowercased from
/// the HTTP layer; values that are not UTF-8 are carried lossily.
fn header_values(headers: &HeaderMap) -> ValuesList {
    let mut list = ValuesList::new();
    for (name, value) in headers {
        list.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    list
}

/// Parses an `application/x-www-form-urlencoded` payload, keeping repeated
/// keys. A payload that does not parse yields an empty view.
fn urlencoded_values(raw: &str) -> ValuesList {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            tracing::debug!(error = %e, "urlencoded parse failed");
            ValuesList::new()
        }
    }
}

async fn parse_multipart(
    body: Bytes,
    content_type: &str,
) -> Result<(ValuesList, FileMap), multer::Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = ValuesList::new();
    let mut files = FileMap::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let content = field.bytes().await?;
        match file_name {
            Some(file_name) => files.append(name, UploadedFile::new(file_name, content)),
            None => fields.append(name, String::from_utf8_lossy(&content).into_owned()),
        }
    }
    Ok((fields, files))
}
