use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::blocking::Client;
use tracing::debug;

use crate::store::PageStore;
use crate::store::StoreError;

const XMLRPC_PATH: &str = "/lib/exe/xmlrpc.php";

/// DokuWiki signals a missing page on `wiki.getPage` with this fault code.
const FAULT_PAGE_NOT_FOUND: i32 = 100;

/// A `PageStore` backed by a DokuWiki XML-RPC endpoint.
///
/// Credentials are threaded in as explicit values and sent as query
/// parameters on every call; there is no ambient session state.
pub struct DokuWikiStore {
	endpoint: String,
	user: String,
	password: String,
	client: Client,
}

impl DokuWikiStore {
	/// Connect to a wiki and verify reachability and credentials up front via
	/// `dokuwiki.getVersion`, so systemic failures surface before any page
	/// work starts.
	///
	/// `base_url` may be given with or without the XML-RPC path suffix.
	pub fn connect(
		base_url: &str,
		user: &str,
		password: &str,
		insecure: bool,
	) -> Result<Self, StoreError> {
		let base = base_url.trim_end_matches('/');
		let base = base.strip_suffix(XMLRPC_PATH).unwrap_or(base);

		let client = Client::builder()
			.danger_accept_invalid_certs(insecure)
			.build()
			.map_err(|err| StoreError::Network(err.to_string()))?;

		let store = Self {
			endpoint: format!("{base}{XMLRPC_PATH}"),
			user: user.to_string(),
			password: password.to_string(),
			client,
		};

		match store.call("dokuwiki.getVersion", &[]) {
			Ok(version) => {
				debug!("connected to DokuWiki {}", version.as_text());
				Ok(store)
			}
			// A fault on the version probe means the endpoint answered but
			// rejected us.
			Err(StoreError::Fault { code, message }) => {
				Err(StoreError::Auth(format!("fault {code}: {message}")))
			}
			Err(err) => Err(err),
		}
	}

	fn call(&self, method: &str, params: &[RpcValue]) -> Result<RpcValue, StoreError> {
		let body = build_method_call(method, params);

		let response = self
			.client
			.post(&self.endpoint)
			.query(&[("u", self.user.as_str()), ("p", self.password.as_str())])
			.header("Content-Type", "text/xml")
			.body(body)
			.send()
			.map_err(|err| StoreError::Network(err.to_string()))?;

		let status = response.status();
		if status.as_u16() == 401 || status.as_u16() == 403 {
			return Err(StoreError::Auth(format!("http status {status}")));
		}
		if !status.is_success() {
			return Err(StoreError::Network(format!("http status {status}")));
		}

		let text = response
			.text()
			.map_err(|err| StoreError::Network(err.to_string()))?;
		parse_method_response(&text)
	}
}

impl PageStore for DokuWikiStore {
	fn get(&self, page_id: &str) -> Result<Option<String>, StoreError> {
		resolve_page_fetch(self.call("wiki.getPage", &[RpcValue::Str(page_id.to_string())]))
	}

	fn put(&self, page_id: &str, content: &str, summary: &str) -> Result<(), StoreError> {
		let attrs = RpcValue::Struct(vec![
			("sum".to_string(), RpcValue::Str(summary.to_string())),
			("minor".to_string(), RpcValue::Bool(false)),
		]);
		self.call(
			"wiki.putPage",
			&[
				RpcValue::Str(page_id.to_string()),
				RpcValue::Str(content.to_string()),
				attrs,
			],
		)
		.map(|_| ())
	}
}

/// Interpret a `wiki.getPage` result. The not-found fault code and an empty
/// returned body both mean the page is absent; any other fault stays a fetch
/// error so it is recorded per page rather than silently turned into a create
/// attempt.
pub(crate) fn resolve_page_fetch(
	result: Result<RpcValue, StoreError>,
) -> Result<Option<String>, StoreError> {
	match result {
		Ok(value) => {
			let text = value.as_text();
			if text.is_empty() {
				Ok(None)
			} else {
				Ok(Some(text.to_string()))
			}
		}
		Err(StoreError::Fault {
			code: FAULT_PAGE_NOT_FOUND,
			..
		}) => Ok(None),
		Err(err) => Err(err),
	}
}

/// The subset of XML-RPC values the DokuWiki API exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RpcValue {
	Str(String),
	Bool(bool),
	Struct(Vec<(String, RpcValue)>),
}

impl RpcValue {
	fn as_text(&self) -> &str {
		match self {
			Self::Str(s) => s.as_str(),
			Self::Bool(true) => "1",
			Self::Bool(false) => "0",
			Self::Struct(_) => "",
		}
	}
}

pub(crate) fn build_method_call(method: &str, params: &[RpcValue]) -> String {
	let mut body = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
	body.push_str(&escape_xml(method));
	body.push_str("</methodName><params>");
	for param in params {
		body.push_str("<param>");
		write_value(&mut body, param);
		body.push_str("</param>");
	}
	body.push_str("</params></methodCall>");
	body
}

fn write_value(out: &mut String, value: &RpcValue) {
	out.push_str("<value>");
	match value {
		RpcValue::Str(s) => {
			out.push_str("<string>");
			out.push_str(&escape_xml(s));
			out.push_str("</string>");
		}
		RpcValue::Bool(b) => {
			out.push_str("<boolean>");
			out.push_str(if *b { "1" } else { "0" });
			out.push_str("</boolean>");
		}
		RpcValue::Struct(members) => {
			out.push_str("<struct>");
			for (name, member) in members {
				out.push_str("<member><name>");
				out.push_str(&escape_xml(name));
				out.push_str("</name>");
				write_value(out, member);
				out.push_str("</member>");
			}
			out.push_str("</struct>");
		}
	}
	out.push_str("</value>");
}

fn escape_xml(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Parse a methodResponse, returning the first parameter value or the fault
/// as an error.
pub(crate) fn parse_method_response(xml: &str) -> Result<RpcValue, StoreError> {
	let mut reader = Reader::from_str(xml);
	reader.trim_text(true);

	let mut buf = Vec::new();
	let mut stack: Vec<String> = Vec::new();
	let mut in_fault = false;
	let mut member_name = String::new();
	let mut fault_code: i32 = 0;
	let mut fault_string = String::new();
	let mut value: Option<RpcValue> = None;

	loop {
		match reader.read_event_into(&mut buf) {
			Ok(Event::Start(e)) => {
				let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
				if name == "fault" {
					in_fault = true;
				}
				stack.push(name);
			}
			Ok(Event::End(_)) => {
				stack.pop();
			}
			Ok(Event::Text(t)) => {
				let text = t
					.unescape()
					.map_err(|err| StoreError::Protocol(err.to_string()))?
					.into_owned();
				let Some(leaf) = stack.last() else {
					continue;
				};
				if in_fault {
					match leaf.as_str() {
						"name" => member_name = text,
						"int" | "i4" if member_name == "faultCode" => {
							fault_code = text.trim().parse().unwrap_or(0);
						}
						"string" | "value" if member_name == "faultString" => {
							fault_string = text;
						}
						_ => {}
					}
				} else {
					match leaf.as_str() {
						"string" => value = Some(RpcValue::Str(text)),
						"boolean" => value = Some(RpcValue::Bool(text.trim() == "1")),
						"int" | "i4" | "double" => {
							value = Some(RpcValue::Str(text.trim().to_string()));
						}
						// A bare <value> without a type element is a string.
						"value" if value.is_none() => value = Some(RpcValue::Str(text)),
						_ => {}
					}
				}
			}
			Ok(Event::Eof) => break,
			Ok(_) => {}
			Err(err) => return Err(StoreError::Protocol(err.to_string())),
		}
		buf.clear();
	}

	if in_fault {
		return Err(StoreError::Fault {
			code: fault_code,
			message: fault_string,
		});
	}

	// An empty <string/> body produces no text event at all.
	Ok(value.unwrap_or(RpcValue::Str(String::new())))
}
