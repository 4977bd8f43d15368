pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# MAVERAGE CONFIGURATION
# =============================================================================
# Settings for turning a translation delivery log into a per-minute moving
# average of delivery durations. Every key is optional; command-line flags
# take precedence over the values below.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/maverage/config.yml
#   3. /etc/maverage/config.yml

input:
  # What to do with a line that is not a JSON object:
  #   drop - skip it and keep going (default)
  #   fail - abort the run and report the line number
  on_parse_error: drop

output:
  # Where the JSON-lines series is written
  path: average_delivery_time.json
"#
    .to_string()
}
