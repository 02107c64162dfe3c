//! Tool definitions exposed to the generation model.

use sales_agent_conversation::{ToolDefinition, ToolRegistry};

/// Builds the registry of every dispatchable tool.
#[must_use]
pub fn tool_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolDefinition::new(
            "schedule_callback",
            "Schedule a callback for the customer at a preferred date and time",
        )
        .required("phone_number", "Customer phone number")
        .required("preferred_date", "Preferred date (YYYY-MM-DD)")
        .required("preferred_time", "Preferred time (HH:MM)")
        .optional("notes", "Additional notes"),
    );

    registry.register(
        ToolDefinition::new("create_lead", "Create a qualified lead in the CRM system")
            .required("customer_name", "Customer full name")
            .required("phone_number", "Customer phone number")
            .optional("email", "Customer email address")
            .optional("interest", "Product/service interested in")
            .optional("budget", "Stated budget, e.g. 'RWF 50,000' or 'high'")
            .optional("timeline", "When the customer wants to buy, e.g. 'this week'")
            .optional("notes", "Additional notes"),
    );

    registry.register(
        ToolDefinition::new("search_inventory", "Search for products or services in inventory")
            .required("query", "Search query")
            .optional("category", "Exact category to filter by")
            .optional("location", "Exact location to filter by"),
    );

    registry.register(
        ToolDefinition::new("send_brochure", "Send marketing brochure via WhatsApp")
            .required("phone_number", "Customer phone number")
            .optional("brochure_type", "Which brochure to send")
            .one_of(&["general", "insurance", "transport", "broker"]),
    );

    registry.register(
        ToolDefinition::new("get_pricing", "Get pricing information for services")
            .required("service_type", "Service to price")
            .one_of(&["insurance", "transport", "broker"])
            .optional("plan", "Plan name; defaults to 'standard'"),
    );

    registry.register(
        ToolDefinition::new(
            "update_bant",
            "Update BANT qualification (Budget, Authority, Need, Timing)",
        )
        .required("session_id", "Current conversation session id")
        .optional("budget", "Customer budget")
        .optional("authority", "Whether the customer can decide")
        .optional("need", "What the customer needs")
        .optional("timing", "When the customer needs it"),
    );

    registry.register(
        ToolDefinition::new(
            "check_availability",
            "Check whether a service is available in a location",
        )
        .required("service_type", "Service to check")
        .required("location", "Where the service is needed")
        .optional("datetime_requested", "Requested date and time"),
    );

    registry
}
