//! Initial database migration.
//!
//! Creates companies and memberships, the numbering counters, every document
//! table with its line items, the BRC tables, `updated_at` triggers and RLS
//! policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANCY
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(COMPANY_USERS_SQL).await?;

        // ============================================================
        // PART 2: NUMBERING
        // ============================================================
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 3: SALES DOCUMENTS
        // ============================================================
        db.execute_unprepared(ENQUIRIES_SQL).await?;
        db.execute_unprepared(PROFORMA_INVOICES_SQL).await?;
        db.execute_unprepared(QUOTES_SQL).await?;
        db.execute_unprepared(EXPORT_ORDERS_SQL).await?;

        // ============================================================
        // PART 4: PURCHASING
        // ============================================================
        db.execute_unprepared(PURCHASE_ORDERS_SQL).await?;

        // ============================================================
        // PART 5: CUSTOMS & LOGISTICS
        // ============================================================
        db.execute_unprepared(SHIPPING_BILLS_SQL).await?;
        db.execute_unprepared(SHIPMENTS_SQL).await?;

        // ============================================================
        // PART 6: BANK REALIZATION
        // ============================================================
        db.execute_unprepared(BRCS_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 8: ROW LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL DEFINITIONS
// ============================================================

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    base_currency CHAR(3) NOT NULL DEFAULT 'USD',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_company_currency_format CHECK (base_currency ~ '^[A-Z]{3}$')
);
";

const COMPANY_USERS_SQL: &str = r"
CREATE TABLE company_users (
    user_id UUID NOT NULL,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    role VARCHAR(20) NOT NULL DEFAULT 'viewer',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (user_id, company_id),

    CONSTRAINT chk_company_user_role CHECK (role IN ('owner', 'admin', 'manager', 'staff', 'viewer'))
);

CREATE INDEX idx_company_users_company ON company_users(company_id);
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
CREATE TABLE document_sequences (
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    document_type VARCHAR(30) NOT NULL,
    year INTEGER NOT NULL,
    last_value BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (company_id, document_type, year),

    CONSTRAINT chk_sequence_positive CHECK (last_value > 0)
);
";

const ENQUIRIES_SQL: &str = r"
CREATE TABLE enquiries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    enquiry_number VARCHAR(30) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'new',
    priority VARCHAR(10) NOT NULL DEFAULT 'medium',
    source VARCHAR(50),
    customer_name VARCHAR(255) NOT NULL,
    customer_email VARCHAR(255),
    customer_phone VARCHAR(50),
    customer_company VARCHAR(255),
    notes TEXT,
    quote_id UUID,
    converted_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_enquiries_number UNIQUE (company_id, enquiry_number),
    CONSTRAINT chk_enquiry_status CHECK (status IN ('new', 'contacted', 'quoted', 'won', 'lost', 'converted')),
    CONSTRAINT chk_enquiry_priority CHECK (priority IN ('low', 'medium', 'high', 'urgent'))
);

CREATE INDEX idx_enquiries_company_status ON enquiries(company_id, status);
CREATE INDEX idx_enquiries_created ON enquiries(company_id, created_at DESC);

CREATE TABLE enquiry_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    enquiry_id UUID NOT NULL REFERENCES enquiries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    product_id UUID,
    description TEXT NOT NULL,
    quantity NUMERIC(18, 3) NOT NULL,
    unit VARCHAR(20) NOT NULL DEFAULT 'pcs',
    expected_price NUMERIC(18, 2),

    CONSTRAINT chk_enquiry_item_quantity CHECK (quantity > 0)
);

CREATE INDEX idx_enquiry_items_enquiry ON enquiry_items(enquiry_id, position);
";

const PROFORMA_INVOICES_SQL: &str = r"
CREATE TABLE proforma_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    invoice_number VARCHAR(30) NOT NULL,
    invoice_type VARCHAR(20) NOT NULL DEFAULT 'proforma',
    status VARCHAR(20) NOT NULL DEFAULT 'draft',
    version INTEGER NOT NULL DEFAULT 1,
    quote_id UUID,
    export_order_id UUID,
    buyer_name VARCHAR(255) NOT NULL,
    buyer_address TEXT,
    currency CHAR(3) NOT NULL,
    issue_date DATE NOT NULL,
    total_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    notes TEXT,
    submitted_by UUID,
    submitted_at TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    converted_to_commercial_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_proforma_invoices_number UNIQUE (company_id, invoice_number),
    CONSTRAINT chk_proforma_status CHECK (status IN ('draft', 'pending', 'approved', 'rejected', 'revised', 'converted')),
    CONSTRAINT chk_proforma_invoice_type CHECK (invoice_type IN ('proforma', 'commercial')),
    CONSTRAINT chk_commercial_has_timestamp CHECK (
        invoice_type = 'proforma' OR converted_to_commercial_at IS NOT NULL
    )
);

CREATE INDEX idx_proforma_invoices_company_status ON proforma_invoices(company_id, status);

CREATE TABLE proforma_invoice_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    proforma_invoice_id UUID NOT NULL REFERENCES proforma_invoices(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    sku_id UUID,
    description TEXT NOT NULL,
    hsn_code VARCHAR(20),
    quantity NUMERIC(18, 3) NOT NULL,
    unit VARCHAR(20) NOT NULL DEFAULT 'pcs',
    unit_price NUMERIC(22, 6) NOT NULL,
    tax_percent NUMERIC(5, 2) NOT NULL DEFAULT 0,
    net_weight NUMERIC(18, 3),
    gross_weight NUMERIC(18, 3),
    line_total NUMERIC(18, 2) NOT NULL,

    CONSTRAINT chk_proforma_item_quantity CHECK (quantity > 0)
);

CREATE INDEX idx_proforma_items_invoice ON proforma_invoice_items(proforma_invoice_id, position);
";

const QUOTES_SQL: &str = r"
CREATE TABLE quotes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    quote_number VARCHAR(30) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'draft',
    version INTEGER NOT NULL DEFAULT 1,
    enquiry_id UUID REFERENCES enquiries(id),
    proforma_invoice_id UUID REFERENCES proforma_invoices(id),
    buyer_name VARCHAR(255) NOT NULL,
    buyer_email VARCHAR(255),
    currency CHAR(3) NOT NULL,
    valid_until DATE NOT NULL,
    total_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    notes TEXT,
    submitted_by UUID,
    submitted_at TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    sent_at TIMESTAMPTZ,
    converted_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_quotes_number UNIQUE (company_id, quote_number),
    CONSTRAINT chk_quote_status CHECK (status IN (
        'draft', 'pending_approval', 'sent', 'approved', 'rejected', 'revised', 'converted', 'expired'
    )),
    CONSTRAINT chk_quote_version CHECK (version >= 1)
);

CREATE INDEX idx_quotes_company_status ON quotes(company_id, status);
CREATE INDEX idx_quotes_expiry ON quotes(valid_until)
    WHERE status IN ('draft', 'sent', 'pending_approval');

CREATE TABLE quote_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    quote_id UUID NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    sku_id UUID,
    description TEXT NOT NULL,
    hsn_code VARCHAR(20),
    quantity NUMERIC(18, 3) NOT NULL,
    unit VARCHAR(20) NOT NULL DEFAULT 'pcs',
    unit_price NUMERIC(18, 2) NOT NULL,
    discount_percent NUMERIC(5, 2) NOT NULL DEFAULT 0,
    tax_percent NUMERIC(5, 2) NOT NULL DEFAULT 0,
    line_total NUMERIC(18, 2) NOT NULL,

    CONSTRAINT chk_quote_item_quantity CHECK (quantity > 0),
    CONSTRAINT chk_quote_item_discount CHECK (discount_percent BETWEEN 0 AND 100)
);

CREATE INDEX idx_quote_items_quote ON quote_items(quote_id, position);

ALTER TABLE enquiries
    ADD CONSTRAINT fk_enquiries_quote FOREIGN KEY (quote_id) REFERENCES quotes(id);
ALTER TABLE proforma_invoices
    ADD CONSTRAINT fk_proforma_invoices_quote FOREIGN KEY (quote_id) REFERENCES quotes(id);
";

const EXPORT_ORDERS_SQL: &str = r"
CREATE TABLE export_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    order_number VARCHAR(30) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    proforma_invoice_id UUID REFERENCES proforma_invoices(id),
    buyer_name VARCHAR(255) NOT NULL,
    currency CHAR(3) NOT NULL,
    order_date DATE NOT NULL,
    total_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_export_orders_number UNIQUE (company_id, order_number),
    CONSTRAINT chk_export_order_status CHECK (status IN (
        'pending', 'approved', 'rejected', 'confirmed', 'in_production',
        'ready', 'shipped', 'completed', 'cancelled'
    ))
);

CREATE INDEX idx_export_orders_company_status ON export_orders(company_id, status);

CREATE TABLE export_order_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    export_order_id UUID NOT NULL REFERENCES export_orders(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    sku_id UUID,
    description TEXT NOT NULL,
    hsn_code VARCHAR(20),
    quantity NUMERIC(18, 3) NOT NULL,
    unit VARCHAR(20) NOT NULL DEFAULT 'pcs',
    unit_price NUMERIC(22, 6) NOT NULL,
    line_total NUMERIC(18, 2) NOT NULL,

    CONSTRAINT chk_export_order_item_quantity CHECK (quantity > 0)
);

CREATE INDEX idx_export_order_items_order ON export_order_items(export_order_id, position);

ALTER TABLE proforma_invoices
    ADD CONSTRAINT fk_proforma_invoices_order FOREIGN KEY (export_order_id) REFERENCES export_orders(id);
";

const PURCHASE_ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    po_number VARCHAR(30) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'draft',
    payment_status VARCHAR(10) NOT NULL DEFAULT 'unpaid',
    vendor_name VARCHAR(255) NOT NULL,
    currency CHAR(3) NOT NULL,
    order_date DATE NOT NULL,
    total_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    paid_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    submitted_by UUID,
    submitted_at TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_purchase_orders_number UNIQUE (company_id, po_number),
    CONSTRAINT chk_purchase_order_status CHECK (status IN (
        'draft', 'pending', 'approved', 'rejected', 'ordered', 'received', 'cancelled'
    )),
    CONSTRAINT chk_purchase_order_payment_status CHECK (payment_status IN ('unpaid', 'partial', 'paid'))
);

CREATE INDEX idx_purchase_orders_company_status ON purchase_orders(company_id, status);

CREATE TABLE purchase_order_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    purchase_order_id UUID NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    sku_id UUID,
    description TEXT NOT NULL,
    quantity NUMERIC(18, 3) NOT NULL,
    unit VARCHAR(20) NOT NULL DEFAULT 'pcs',
    unit_price NUMERIC(22, 6) NOT NULL,
    tax_percent NUMERIC(5, 2) NOT NULL DEFAULT 0,
    line_total NUMERIC(18, 2) NOT NULL,

    CONSTRAINT chk_purchase_order_item_quantity CHECK (quantity > 0)
);

CREATE INDEX idx_purchase_order_items_po ON purchase_order_items(purchase_order_id, position);

CREATE TABLE purchase_order_payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    purchase_order_id UUID NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    amount NUMERIC(18, 2) NOT NULL,
    payment_date DATE NOT NULL,
    reference VARCHAR(100),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_purchase_order_payment_amount CHECK (amount > 0)
);

CREATE INDEX idx_purchase_order_payments_po ON purchase_order_payments(purchase_order_id);
";

const SHIPPING_BILLS_SQL: &str = r"
CREATE TABLE shipping_bills (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    sb_number VARCHAR(30) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'drafted',
    export_order_id UUID NOT NULL REFERENCES export_orders(id),
    port_code VARCHAR(10),
    currency CHAR(3) NOT NULL,
    fob_value NUMERIC(18, 2) NOT NULL DEFAULT 0,
    freight NUMERIC(18, 2) NOT NULL DEFAULT 0,
    insurance NUMERIC(18, 2) NOT NULL DEFAULT 0,
    filed_by UUID,
    filed_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_shipping_bills_number UNIQUE (company_id, sb_number),
    CONSTRAINT chk_shipping_bill_status CHECK (status IN (
        'drafted', 'pending', 'filed', 'cleared', 'shipped', 'rejected', 'cancelled'
    )),
    CONSTRAINT chk_shipping_bill_values CHECK (fob_value >= 0 AND freight >= 0 AND insurance >= 0)
);

CREATE INDEX idx_shipping_bills_company_status ON shipping_bills(company_id, status);
CREATE INDEX idx_shipping_bills_order ON shipping_bills(export_order_id);
";

const SHIPMENTS_SQL: &str = r"
CREATE TABLE shipments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    export_order_id UUID NOT NULL REFERENCES export_orders(id),
    shipping_bill_id UUID REFERENCES shipping_bills(id),
    status VARCHAR(20) NOT NULL DEFAULT 'planned',
    shipment_date DATE NOT NULL,
    incoterm VARCHAR(10),
    carrier VARCHAR(100),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_shipment_status CHECK (status IN ('planned', 'in_transit', 'delivered'))
);

CREATE INDEX idx_shipments_order ON shipments(export_order_id);

CREATE TABLE shipment_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    shipment_id UUID NOT NULL REFERENCES shipments(id) ON DELETE CASCADE,
    export_order_item_id UUID NOT NULL REFERENCES export_order_items(id),
    quantity NUMERIC(18, 3) NOT NULL,

    CONSTRAINT chk_shipment_item_quantity CHECK (quantity > 0)
);

CREATE INDEX idx_shipment_items_order_item ON shipment_items(export_order_item_id);
";

const BRCS_SQL: &str = r"
CREATE TABLE brcs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    shipping_bill_id UUID NOT NULL REFERENCES shipping_bills(id),
    brc_number VARCHAR(50),
    currency CHAR(3) NOT NULL,
    total_expected NUMERIC(18, 2) NOT NULL,
    pending_amount NUMERIC(18, 2) NOT NULL,
    realization_status VARCHAR(10) NOT NULL DEFAULT 'pending',
    due_date DATE NOT NULL,
    is_overdue BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_brc_status CHECK (realization_status IN ('pending', 'partial', 'full')),
    CONSTRAINT chk_brc_total CHECK (total_expected > 0)
);

CREATE UNIQUE INDEX uq_brcs_number ON brcs(company_id, brc_number) WHERE brc_number IS NOT NULL;
CREATE INDEX idx_brcs_company_due ON brcs(company_id, due_date)
    WHERE realization_status <> 'full';

CREATE TABLE brc_payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    brc_id UUID NOT NULL REFERENCES brcs(id) ON DELETE CASCADE,
    amount NUMERIC(18, 2) NOT NULL,
    payment_date DATE NOT NULL,
    reference VARCHAR(100),
    exchange_rate NUMERIC(18, 6),
    inr_amount NUMERIC(18, 2),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_brc_payment_amount CHECK (amount > 0),
    CONSTRAINT chk_brc_payment_rate CHECK (exchange_rate IS NULL OR exchange_rate > 0)
);

CREATE INDEX idx_brc_payments_brc ON brc_payments(brc_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: touch_updated_at
-- Keeps updated_at current on every row update
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_companies_updated_at BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_company_users_updated_at BEFORE UPDATE ON company_users
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_document_sequences_updated_at BEFORE UPDATE ON document_sequences
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_enquiries_updated_at BEFORE UPDATE ON enquiries
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_quotes_updated_at BEFORE UPDATE ON quotes
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_proforma_invoices_updated_at BEFORE UPDATE ON proforma_invoices
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_export_orders_updated_at BEFORE UPDATE ON export_orders
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_purchase_orders_updated_at BEFORE UPDATE ON purchase_orders
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_shipping_bills_updated_at BEFORE UPDATE ON shipping_bills
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_shipments_updated_at BEFORE UPDATE ON shipments
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_brcs_updated_at BEFORE UPDATE ON brcs
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const RLS_SQL: &str = r"
-- ============================================================
-- Enable RLS on all tenant tables
-- company_users stays readable: membership is resolved before a
-- company context exists
-- ============================================================
ALTER TABLE document_sequences ENABLE ROW LEVEL SECURITY;
ALTER TABLE enquiries ENABLE ROW LEVEL SECURITY;
ALTER TABLE enquiry_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE quotes ENABLE ROW LEVEL SECURITY;
ALTER TABLE quote_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE proforma_invoices ENABLE ROW LEVEL SECURITY;
ALTER TABLE proforma_invoice_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE export_orders ENABLE ROW LEVEL SECURITY;
ALTER TABLE export_order_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_orders ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_order_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_order_payments ENABLE ROW LEVEL SECURITY;
ALTER TABLE shipping_bills ENABLE ROW LEVEL SECURITY;
ALTER TABLE shipments ENABLE ROW LEVEL SECURITY;
ALTER TABLE shipment_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE brcs ENABLE ROW LEVEL SECURITY;
ALTER TABLE brc_payments ENABLE ROW LEVEL SECURITY;

-- ============================================================
-- Company-scoped tables
-- ============================================================
CREATE POLICY tenant_isolation ON document_sequences
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON enquiries
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON quotes
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON proforma_invoices
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON export_orders
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON purchase_orders
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON shipping_bills
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON shipments
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
CREATE POLICY tenant_isolation ON brcs
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

-- ============================================================
-- Child tables (scoped through their parent)
-- ============================================================
CREATE POLICY tenant_isolation ON enquiry_items
    USING (enquiry_id IN (
        SELECT id FROM enquiries
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON quote_items
    USING (quote_id IN (
        SELECT id FROM quotes
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON proforma_invoice_items
    USING (proforma_invoice_id IN (
        SELECT id FROM proforma_invoices
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON export_order_items
    USING (export_order_id IN (
        SELECT id FROM export_orders
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON purchase_order_items
    USING (purchase_order_id IN (
        SELECT id FROM purchase_orders
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON purchase_order_payments
    USING (purchase_order_id IN (
        SELECT id FROM purchase_orders
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON shipment_items
    USING (shipment_id IN (
        SELECT id FROM shipments
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
CREATE POLICY tenant_isolation ON brc_payments
    USING (brc_id IN (
        SELECT id FROM brcs
        WHERE company_id = current_setting('app.current_company_id', true)::UUID
    ));
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS brc_payments CASCADE;
DROP TABLE IF EXISTS brcs CASCADE;
DROP TABLE IF EXISTS shipment_items CASCADE;
DROP TABLE IF EXISTS shipments CASCADE;
DROP TABLE IF EXISTS shipping_bills CASCADE;
DROP TABLE IF EXISTS purchase_order_payments CASCADE;
DROP TABLE IF EXISTS purchase_order_items CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS export_order_items CASCADE;
DROP TABLE IF EXISTS quote_items CASCADE;
DROP TABLE IF EXISTS proforma_invoice_items CASCADE;
DROP TABLE IF EXISTS enquiry_items CASCADE;
DROP TABLE IF EXISTS export_orders CASCADE;
DROP TABLE IF EXISTS quotes CASCADE;
DROP TABLE IF EXISTS proforma_invoices CASCADE;
DROP TABLE IF EXISTS enquiries CASCADE;
DROP TABLE IF EXISTS document_sequences CASCADE;
DROP TABLE IF EXISTS company_users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP FUNCTION IF EXISTS touch_updated_at();
";
