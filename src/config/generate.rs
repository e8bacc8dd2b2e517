pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGMINER CONFIGURATION
# =============================================================================
# Pulls log entries from Graylog, drops noise, tags entries and stores one CSV
# file per session (entries sharing a correlationId) for later analysis.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/logminer/config.yml
#   3. /etc/logminer/config.yml
#
# $env{...} references are replaced with the value of the named
# environment variable, e.g. api_token: $env{GRAYLOG_API_TOKEN}

# =============================================================================
# GRAYLOG
# =============================================================================

graylog:
  # Base URL of the Graylog web interface / REST API
  url: http://localhost:9000
  # API token (sent as basic auth username, password 'token')
  api_token: $env{GRAYLOG_API_TOKEN}
  # Optional request timeout, e.g. 30s or 2m
  timeout: 60s

# =============================================================================
# STORAGE
# =============================================================================

storage:
  # Directory for session files and the last_included_timestamp watermark
  target_dir: ~/.local/share/logminer/logs

# =============================================================================
# FILTER
# =============================================================================
# Entries lacking correlationId, timestamp or message are always dropped.
# Entries whose message matches any expression below are dropped as well.

filter:
  expressions:
    - '^Health check'

# =============================================================================
# TAGGERS
# =============================================================================
# Each tagger adds one field (target) derived from an existing field (source).
# Static mappings are tried first (label -> regex list), then extractors whose
# single capture group becomes the value, then default_value.
# With tag_all, the first entry producing a label tags the whole session.

taggers:
  - target: approach
    source: message
    default_value: unknown
    tag_all: true
    mappings:
      web: ['via web client']
      mobile: ['via mobile app']
  - target: order_id
    source: message
    default_value: ''
    tag_all: true
    extractors:
      - 'order=(\d+)'
"#
    .to_string()
}
