use crate::config::{Policy, ProxyServer, DIRECT};
use crate::dispatch::Decision;
use crate::script::{to_js_literal, ScriptError, SCRIPT_SENTINEL};
use linked_hash_map::LinkedHashMap;
use steerapi::RuleSchema;

const SCRIPT_HEAD: &str = "function FindProxyForURL(url, host) {\n";

// Shell expressions are matched with a local translation instead of the
// host's shExpMatch, whose escaping differs between browsers.
const SCRIPT_BODY: &str = r#"  function globMatch(pattern, subject) {
    var source = "^";
    for (var j = 0; j < pattern.length; j++) {
      var c = pattern.charAt(j);
      if (c === "*") {
        source += "[\\s\\S]*";
      } else if (c === "?") {
        source += "[\\s\\S]";
      } else {
        source += c.replace(/[.*+?^${}()|[\]\\\/]/g, "\\$&");
      }
    }
    return new RegExp(source + "$", "u").test(subject);
  }
  function resolve(name) {
    if (name === "direct") {
      return "DIRECT";
    }
    for (var k = 0; k < proxies.length; k++) {
      if (proxies[k][0] === name) {
        return proxies[k][1];
      }
    }
    return "DIRECT";
  }
  for (var i = 0; i < autoRules.length; i++) {
    var rule = autoRules[i];
    var subject = rule.subject === "host" ? host : url;
    var matched = false;
    try {
      if (rule.type === "shexp") {
        matched = globMatch(rule.pattern, subject);
      } else if (rule.type === "regex") {
        matched = new RegExp(rule.pattern).test(subject);
      } else if (rule.type === "exact") {
        matched = rule.pattern === subject;
      }
    } catch (e) {
      matched = false;
    }
    if (matched) {
      return resolve(rule.proxyName);
    }
  }
  return resolve(autoDefault);
}
"#;

/// PAC directive for a server, e.g. `SOCKS5 127.0.0.1:9050`.
pub fn proxy_directive(server: &ProxyServer) -> String {
    format!(
        "{} {}:{}",
        server.scheme.as_str().to_uppercase(),
        server.host,
        server.effective_port()
    )
}

/// The value `FindProxyForURL` returns for a decision under `policy`.
pub fn decision_directive(policy: &Policy, decision: &Decision) -> String {
    match decision {
        Decision::Direct => "DIRECT".to_string(),
        Decision::Proxy(name) => policy
            .proxy_by_name(name)
            .map(|p| proxy_directive(&p.server))
            .unwrap_or_else(|| "DIRECT".to_string()),
    }
}

/// Proxy name to directive, in policy order. A repeated name keeps its first
/// entry, matching lookups by name.
pub fn proxy_map(policy: &Policy) -> LinkedHashMap<String, String> {
    let mut map = LinkedHashMap::new();
    for proxy in policy.proxies.iter() {
        if proxy.name == DIRECT || map.contains_key(&proxy.name) {
            continue;
        }
        map.insert(proxy.name.clone(), proxy_directive(&proxy.server));
    }
    map
}

/// Generate a self-contained PAC script routing exactly like
/// [`crate::dispatch::decide`]. The output only depends on the policy.
pub fn generate(policy: &Policy) -> Result<String, ScriptError> {
    let rules: Vec<RuleSchema> = policy.auto_rules.iter().map(RuleSchema::from).collect();
    let proxy_map = proxy_map(policy);
    let mut script = String::new();
    script.push_str("// ");
    script.push_str(SCRIPT_SENTINEL);
    script.push('\n');
    script.push_str(SCRIPT_HEAD);
    push_var(&mut script, "autoRules", &to_js_literal(&rules)?);
    push_var(&mut script, "autoDefault", &to_js_literal(&policy.auto_default)?);
    // Name and directive pairs; an object literal would give names such as
    // `__proto__` their inherited meaning.
    let proxies: Vec<(&String, &String)> = proxy_map.iter().collect();
    push_var(&mut script, "proxies", &to_js_literal(&proxies)?);
    script.push_str(SCRIPT_BODY);
    Ok(script)
}

fn push_var(script: &mut String, name: &str, literal: &str) {
    script.push_str("  var ");
    script.push_str(name);
    script.push_str(" = ");
    script.push_str(literal);
    script.push_str(";\n");
}
